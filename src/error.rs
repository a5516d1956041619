use snafu::{Location, Snafu};

use crate::ledger::LedgerError;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ApplicationError {
    /// could not parse the environment configuration
    ConfigLoad {
        source: envy::Error,
        #[snafu(implicit)]
        location: Location,
    },

    /// ACCOUNTS must list at least one handle
    NoAccounts {
        #[snafu(implicit)]
        location: Location,
    },

    /// could not open the alert ledger
    OpenLedger {
        source: LedgerError,
        #[snafu(implicit)]
        location: Location,
    },

    /// could not build the http client
    HttpClient {
        source: reqwest::Error,
        #[snafu(implicit)]
        location: Location,
    },

    /// could not initialize the logger
    InitializeLogger {
        source: tracing::subscriber::SetGlobalDefaultError,
        #[snafu(implicit)]
        location: Location,
    },
}
