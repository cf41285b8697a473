use crate::console::{ConsoleNotifier, TerminalConfirm};
use anyhow::Context as _;
use pdfdesk_core::api::ApiClient;
use pdfdesk_core::config::PdfdeskConfig;
use pdfdesk_core::logging::init_logging;
use pdfdesk_core::notify::{AlwaysConfirm, Confirm, Notifier};
use std::path::Path;
use std::sync::Arc;

/// Everything a command needs: configuration, a signed-in client if one was
/// stored, and the console's confirm/notify hooks
pub struct Context {
    pub config: PdfdeskConfig,
    pub client: ApiClient,
    pub confirm: Box<dyn Confirm>,
    pub notifier: Arc<dyn Notifier>,
}

impl Context {
    pub async fn build(config_path: &Path, base_url: Option<&str>, assume_yes: bool) -> anyhow::Result<Self> {
        let mut config = PdfdeskConfig::load_from(config_path)?;
        if let Some(url) = base_url {
            config.api.base_url = url.to_string();
        }
        config.validate()?;
        init_logging(&config.logging.to_logging_config())?;

        let session = config.session.handle();
        if session.restore().await.context("Failed to read stored session")? {
            log::debug!("Restored stored session");
        }
        let client = ApiClient::from_config(&config.api, session)?;

        let confirm: Box<dyn Confirm> = if assume_yes { Box::new(AlwaysConfirm) } else { Box::new(TerminalConfirm) };

        Ok(Self { config, client, confirm, notifier: Arc::new(ConsoleNotifier) })
    }

    pub fn confirm(&self) -> &dyn Confirm {
        self.confirm.as_ref()
    }

    /// Fail early for commands that need a signed-in user
    pub fn require_session(&self) -> anyhow::Result<()> {
        if self.client.session().is_authenticated() {
            Ok(())
        } else {
            anyhow::bail!("Not signed in. Run `pdfdesk login --email <email>` first")
        }
    }
}
