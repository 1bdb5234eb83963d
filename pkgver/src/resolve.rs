//! Resolution orchestrator: run probes in order and render the first signal.

use std::path::Path;

use tracing::{debug, instrument, warn};

use crate::core::facts::{Origin, RawVersionFacts, RenderedVersion, Signal};
use crate::core::render::{is_dirty_version, render};
use crate::error::{ResolveError, VersionUnknown};
use crate::io::config::{PkgverConfig, load_project_config};
use crate::probe::{Probe, default_probes};

/// Ordered probe list plus the configuration they run with.
pub struct Resolver {
    config: PkgverConfig,
    probes: Vec<Box<dyn Probe>>,
}

impl Resolver {
    /// Resolver with the default probe order backed by the git CLI.
    pub fn new(config: PkgverConfig) -> Self {
        Self::with_probes(config, default_probes())
    }

    pub fn with_probes(config: PkgverConfig, probes: Vec<Box<dyn Probe>>) -> Self {
        Self { config, probes }
    }

    /// Load the configuration governing `dir` and build a resolver.
    pub fn for_dir(dir: &Path) -> Result<Self, VersionUnknown> {
        let config = load_project_config(dir, None)
            .map_err(|err| ResolveError::Config(format!("{err:#}")))?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &PkgverConfig {
        &self.config
    }

    /// Resolve the version of `dir`.
    ///
    /// The first probe with a signal decides. A probe error stops the search:
    /// falling through to a weaker signal would report a guess.
    #[instrument(skip_all, fields(dir = %dir.display()))]
    pub fn resolve(&self, dir: &Path) -> Result<RenderedVersion, VersionUnknown> {
        let dir = dir.canonicalize().map_err(|source| ResolveError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        for probe in &self.probes {
            match probe.probe(&dir, &self.config) {
                Ok(Some(signal)) => {
                    debug!(probe = probe.name(), "signal found");
                    let rendered = self.finish(signal)?;
                    debug!(version = %rendered.version, dirty = rendered.dirty, "resolved");
                    return Ok(rendered);
                }
                Ok(None) => debug!(probe = probe.name(), "not applicable"),
                Err(cause) => {
                    warn!(probe = probe.name(), kind = cause.kind(), error = %cause, "probe failed");
                    return Err(cause.into());
                }
            }
        }
        Err(ResolveError::NoSignalFound { dir }.into())
    }

    fn finish(&self, signal: Signal) -> Result<RenderedVersion, ResolveError> {
        match signal {
            Signal::History(facts) => {
                let version = render(&facts, self.config.local_scheme)?;
                Ok(RenderedVersion {
                    version,
                    dirty: facts.is_dirty,
                    origin: Origin::History {
                        tag: tag_text(&facts),
                        distance: facts.distance,
                        short_id: facts.short_id,
                    },
                })
            }
            Signal::Archive(facts) => {
                let version = render(&facts, self.config.local_scheme)?;
                Ok(RenderedVersion {
                    version,
                    dirty: false,
                    origin: Origin::Archive {
                        tag: tag_text(&facts),
                        short_id: facts.short_id,
                    },
                })
            }
            // Already final; never re-derived.
            Signal::Frozen(frozen) => Ok(RenderedVersion {
                dirty: is_dirty_version(&frozen.text),
                version: frozen.text,
                origin: Origin::Frozen { path: frozen.path },
            }),
            Signal::DirectoryName(found) => Ok(RenderedVersion {
                version: found.version,
                dirty: false,
                origin: Origin::DirectoryName {
                    project: found.project,
                },
            }),
        }
    }
}

fn tag_text(facts: &RawVersionFacts) -> Option<String> {
    facts.baseline.tag().map(|tag| tag.text.clone())
}

/// Resolve `dir` with the configuration found in it.
pub fn resolve_dir(dir: &Path) -> Result<RenderedVersion, VersionUnknown> {
    Resolver::for_dir(dir)?.resolve(dir)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::fs;
    use std::path::PathBuf;
    use std::rc::Rc;

    use super::*;
    use crate::core::facts::{Baseline, DirectoryVersion, FrozenVersion, ReleaseTag};
    use crate::io::config::CONFIG_FILE;

    type Script = Result<Option<Signal>, ResolveError>;

    /// Probe returning a fixed answer and recording that it ran.
    struct ScriptedProbe {
        name: &'static str,
        answer: RefCell<Option<Script>>,
        log: ProbeLog,
    }

    impl Probe for ScriptedProbe {
        fn name(&self) -> &'static str {
            self.name
        }

        fn probe(&self, _dir: &Path, _config: &PkgverConfig) -> Script {
            self.log.borrow_mut().push(self.name);
            self.answer.borrow_mut().take().unwrap_or(Ok(None))
        }
    }

    type ProbeLog = Rc<RefCell<Vec<&'static str>>>;

    fn resolver(answers: Vec<(&'static str, Script)>) -> (Resolver, ProbeLog) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let probes = answers
            .into_iter()
            .map(|(name, answer)| {
                Box::new(ScriptedProbe {
                    name,
                    answer: RefCell::new(Some(answer)),
                    log: Rc::clone(&log),
                }) as Box<dyn Probe>
            })
            .collect();
        (Resolver::with_probes(PkgverConfig::default(), probes), log)
    }

    fn history(tag: &str, distance: u32, dirty: bool) -> Signal {
        Signal::History(RawVersionFacts {
            baseline: Baseline::Tagged(ReleaseTag::parse(tag, "v").expect("tag")),
            distance,
            is_dirty: dirty,
            short_id: Some("abc1234".to_string()),
        })
    }

    #[test]
    fn first_signal_wins_and_later_probes_do_not_run() {
        let temp = tempfile::tempdir().expect("tempdir");
        let (resolver, log) = resolver(vec![
            ("history", Ok(None)),
            ("frozen", Ok(Some(history("v1.0", 0, false)))),
            ("directory-name", Ok(Some(history("v9.0", 0, false)))),
        ]);
        let rendered = resolver.resolve(temp.path()).expect("resolve");
        assert_eq!(rendered.version, "1.0");
        assert_eq!(*log.borrow(), vec!["history", "frozen"]);
    }

    #[test]
    fn probe_error_is_not_downgraded() {
        let temp = tempfile::tempdir().expect("tempdir");
        let (resolver, log) = resolver(vec![
            (
                "history",
                Err(ResolveError::HistoryQueryFailed {
                    command: "git describe".to_string(),
                    detail: "boom".to_string(),
                }),
            ),
            (
                "directory-name",
                Ok(Some(Signal::DirectoryName(DirectoryVersion {
                    project: "x".to_string(),
                    version: "1.0".to_string(),
                }))),
            ),
        ]);
        let err = resolver.resolve(temp.path()).expect_err("failure");
        assert!(matches!(err.cause, ResolveError::HistoryQueryFailed { .. }));
        assert_eq!(*log.borrow(), vec!["history"]);
    }

    #[test]
    fn nothing_applicable_is_no_signal() {
        let temp = tempfile::tempdir().expect("tempdir");
        let (resolver, _) = resolver(vec![("history", Ok(None)), ("frozen", Ok(None))]);
        let err = resolver.resolve(temp.path()).expect_err("unknown");
        assert!(err.is_no_signal());
    }

    #[test]
    fn frozen_text_is_returned_unchanged() {
        let temp = tempfile::tempdir().expect("tempdir");
        let (resolver, _) = resolver(vec![(
            "frozen",
            Ok(Some(Signal::Frozen(FrozenVersion {
                text: "1.0-RC1".to_string(),
                path: PathBuf::from("PKG-INFO"),
            }))),
        )]);
        let rendered = resolver.resolve(temp.path()).expect("resolve");
        assert_eq!(rendered.version, "1.0-RC1");
        assert!(!rendered.dirty);
    }

    #[test]
    fn frozen_dirty_build_stays_dirty() {
        let temp = tempfile::tempdir().expect("tempdir");
        let (resolver, _) = resolver(vec![(
            "frozen",
            Ok(Some(Signal::Frozen(FrozenVersion {
                text: "1.0.post0.dev2+gabc1234.dirty".to_string(),
                path: PathBuf::from("PKG-INFO"),
            }))),
        )]);
        let rendered = resolver.resolve(temp.path()).expect("resolve");
        assert_eq!(rendered.version, "1.0.post0.dev2+gabc1234.dirty");
        assert!(rendered.dirty);
    }

    #[test]
    fn history_facts_are_rendered_with_dirty_flag() {
        let temp = tempfile::tempdir().expect("tempdir");
        let (resolver, _) = resolver(vec![("history", Ok(Some(history("v1.0", 2, true))))]);
        let rendered = resolver.resolve(temp.path()).expect("resolve");
        assert_eq!(rendered.version, "1.0.post0.dev2+gabc1234.dirty");
        assert!(rendered.dirty);
        assert_eq!(
            rendered.origin,
            Origin::History {
                tag: Some("1.0".to_string()),
                distance: 2,
                short_id: Some("abc1234".to_string()),
            }
        );
    }

    #[test]
    fn missing_directory_is_an_io_failure() {
        let temp = tempfile::tempdir().expect("tempdir");
        let (resolver, log) = resolver(vec![("history", Ok(None))]);
        let err = resolver
            .resolve(&temp.path().join("missing"))
            .expect_err("missing dir");
        assert!(matches!(err.cause, ResolveError::Io { .. }));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn invalid_config_is_reported() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(temp.path().join(CONFIG_FILE), "frozen_file = \"../x\"\n").expect("write");
        let err = resolve_dir(temp.path()).expect_err("config");
        assert!(matches!(err.cause, ResolveError::Config(_)));
    }
}
