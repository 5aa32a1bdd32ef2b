#![allow(dead_code)]

use cosmic::app::Settings;
use cosmic::cosmic_config::CosmicConfigEntry;
use cosmic::iced::Limits;

mod application;
mod components;
mod message;
mod pages;

use visadesk::config;
use visadesk::core;
use visadesk::store;

use application::{Flags, VisaDesk};
use config::{AppConfig, CONFIG_VERSION};

/// Both the lib and the bin are named `visadesk`, so every module path of
/// ours starts with it; anything else is a foreign crate.
fn app_target(target: &str) -> bool {
    target == "visadesk" || target.starts_with("visadesk::")
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cosmic_cfg = cosmic::cosmic_config::Config::new("dev.visadesk.app", CONFIG_VERSION)
        .expect("Failed to create cosmic config");
    let config = AppConfig::get_entry(&cosmic_cfg).unwrap_or_else(|(_, cfg)| cfg);

    // Set up logging to the systemd user journal (`journalctl --user -t visadesk -f`).
    // Wrapper filters: visadesk crate at info/debug (per config), everything else at warn.
    {
        struct FilteredJournal {
            inner: systemd_journal_logger::JournalLog,
        }

        impl log::Log for FilteredJournal {
            fn enabled(&self, metadata: &log::Metadata) -> bool {
                if app_target(metadata.target()) {
                    let max = if visadesk::debug_logging() { log::LevelFilter::Debug } else { log::LevelFilter::Info };
                    metadata.level() <= max
                } else {
                    metadata.level() <= log::LevelFilter::Warn
                }
            }
            fn log(&self, record: &log::Record) {
                if self.enabled(record.metadata()) {
                    self.inner.log(record);
                }
            }
            fn flush(&self) {
                self.inner.flush();
            }
        }

        let journal = systemd_journal_logger::JournalLog::new()
            .unwrap()
            .with_syslog_identifier("visadesk".to_string());

        visadesk::set_debug_logging(config.debug_logging);

        log::set_boxed_logger(Box::new(FilteredJournal { inner: journal })).unwrap();
        // Global max must be Debug so visadesk debug logs can pass through when toggled
        log::set_max_level(log::LevelFilter::Debug);
    }

    let mut settings = Settings::default();
    settings = settings.size_limits(Limits::NONE.min_width(500.0).min_height(300.0));

    let flags = Flags { config };
    cosmic::app::run::<VisaDesk>(settings, flags)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::app_target;

    #[test]
    fn only_our_module_paths_get_verbose_logging() {
        assert!(app_target("visadesk"));
        assert!(app_target("visadesk::application"));
        assert!(app_target("visadesk::store::firestore"));
        assert!(!app_target("visadesktop"));
        assert!(!app_target("application_services"));
        assert!(!app_target("pages"));
        assert!(!app_target("reqwest::connect"));
    }
}
