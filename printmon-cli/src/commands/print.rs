//! `printmon print` / `printmon qrcode` — one-shot test calls.

use anyhow::Result;
use clap::Args;

use printmon_core::{Endpoint, FormField};

use crate::app::App;
use crate::GlobalArgs;

/// Form fields; anything omitted comes from the settings' `form` section.
#[derive(Args, Debug, Default)]
pub struct PrintArgs {
    #[arg(long)]
    pub header: Option<String>,

    #[arg(long)]
    pub footer: Option<String>,

    /// Ticket code.
    #[arg(long)]
    pub code: Option<String>,

    #[arg(long)]
    pub services: Option<String>,

    /// Issue date, passed through as typed.
    #[arg(long)]
    pub created_date: Option<String>,

    /// QR payload (only sent to /imprimir/qrcode).
    #[arg(long)]
    pub qrcode: Option<String>,
}

impl PrintArgs {
    fn overrides(self) -> Vec<(FormField, String)> {
        [
            (FormField::Header, self.header),
            (FormField::Footer, self.footer),
            (FormField::Code, self.code),
            (FormField::Services, self.services),
            (FormField::CreatedDate, self.created_date),
            (FormField::QrCode, self.qrcode),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.map(|value| (field, value)))
        .collect()
    }

    /// Always succeeds once settings load; the outcome is in the log.
    pub fn run(self, global: &GlobalArgs, endpoint: Endpoint) -> Result<()> {
        let mut app = App::from_args(global)?;
        for (field, value) in self.overrides() {
            app.form_mut().set(field, value);
        }

        let outcome = app.client().invoke(endpoint, app.form(), app.sink());
        tracing::debug!(url = outcome.url(), responded = outcome.is_responded(), "test call done");
        Ok(())
    }
}
