//! `mpki renew` - Renew an existing certificate from a CSR.

use anyhow::Result;
use mpki_core::EnrollmentType;
use mpki_gateway::PRIOR_CERT_SN;

use super::enroll::{print_result, product_info, read_csr, san_map};
use super::Context;
use crate::cli::args::RenewArgs;

pub async fn execute(ctx: Context, args: RenewArgs) -> Result<()> {
    let gateway = ctx.gateway()?;
    let csr = read_csr(&args.request.csr).await?;
    let product = product_info(&args.request).param(PRIOR_CERT_SN, args.prior_serial.trim());

    let result = gateway
        .enroll_with_type(EnrollmentType::Renew, &csr, &san_map(&args.request), &product)
        .await?;

    print_result(&ctx, &result)
}
