mod certificate;
mod enrollment;
mod profile;
mod status;

pub use certificate::*;
pub use enrollment::*;
pub use profile::*;
pub use status::*;
