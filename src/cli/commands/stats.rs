use crate::cli::utils::output_record;
use crate::cli::CliContext;

pub async fn handle(ctx: &CliContext) -> anyhow::Result<()> {
    let stats = ctx.client()?.stats().await?;
    output_record(&ctx.output_format, &stats)
}
