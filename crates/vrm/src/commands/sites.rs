//! Site command handler.

use tabled::Tabled;
use vrm_api::{Site, VrmClient};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct SiteRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Identifier")]
    identifier: String,
    #[tabled(rename = "Timezone")]
    timezone: String,
}

impl From<&Site> for SiteRow {
    fn from(s: &Site) -> Self {
        Self {
            id: s.id,
            name: s.name.clone(),
            identifier: output::opt(s.identifier.as_ref()),
            timezone: output::opt(s.timezone.as_ref()),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(client: &VrmClient, global: &GlobalOpts) -> Result<(), CliError> {
    let sites = client.get_sites().await?;
    let out = output::render_list(
        &global.output,
        sites.records(),
        |s| SiteRow::from(s),
        |s| s.id.to_string(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
