//! Diagnostic output
//!
//! Diagnostics are either fully silent or verbose. The choice is made once at
//! startup and handed to the runner as a [`Dispatch`], so library code never
//! depends on a global subscriber being installed.

use tracing::Dispatch;
use tracing_subscriber::EnvFilter;

/// Default filter for verbose mode when `RUST_LOG` is unset
const VERBOSE_FILTER: &str = "getjs=debug,warn";

/// Diagnostic mode selected at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Diagnostics {
    /// Nothing but results is printed
    #[default]
    Silent,

    /// Progress and errors are written to stderr
    Verbose { colors: bool },
}

impl Diagnostics {
    pub fn new(verbose: bool, colors: bool) -> Self {
        if verbose {
            Self::Verbose { colors }
        } else {
            Self::Silent
        }
    }

    pub fn is_verbose(&self) -> bool {
        matches!(self, Self::Verbose { .. })
    }

    /// Builds the dispatcher carrying diagnostics for this mode
    pub fn into_dispatch(self) -> Dispatch {
        match self {
            Self::Silent => Dispatch::none(),
            Self::Verbose { colors } => {
                let filter = EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new(VERBOSE_FILTER));

                let subscriber = tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .with_writer(std::io::stderr)
                    .with_ansi(colors)
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_file(false)
                    .finish();

                Dispatch::new(subscriber)
            }
        }
    }
}
