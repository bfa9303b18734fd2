//! Writing an annotated copy of a source tree.
//!
//! The tree is walked once on the calling thread, which also recreates every
//! directory. Files are then processed on the rayon pool; the first failure
//! aborts the run.

use crate::annotate::Annotator;
use crate::java::{self, LanguageLevel};
use crate::registry::RegistryIndex;
use anyhow::{bail, Context, Result};
use rayon::prelude::*;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Companion files shipped next to some platform sources; never parsed.
pub const DEFAULT_SKIP: &str = "*.annotated.java";

pub struct WriterConfig {
    pub language: LanguageLevel,
    pub formatter: Option<SourceFormatter>,
    /// `.java` files matching any of these are copied verbatim.
    pub skip: Vec<glob::Pattern>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WriteSummary {
    /// `.java` files parsed and written through the annotator.
    pub annotated_files: usize,
    pub copied_files: usize,
    /// Declarations whose documentation changed.
    pub declarations: usize,
}

pub struct EnhanceWriter<'a> {
    annotator: Annotator<'a>,
    config: WriterConfig,
}

enum Action {
    Annotate,
    Copy,
}

struct Job {
    source: PathBuf,
    target: PathBuf,
    action: Action,
}

enum Outcome {
    Annotated(usize),
    Copied,
}

impl<'a> EnhanceWriter<'a> {
    pub fn new(index: &'a RegistryIndex, config: WriterConfig) -> Self {
        Self {
            annotator: Annotator::new(index),
            config,
        }
    }

    /// Mirror `source` into `destination`, annotating Java sources on the way.
    pub fn write(&self, source: &Path, destination: &Path) -> Result<WriteSummary> {
        let source = source
            .canonicalize()
            .with_context(|| format!("source directory not found: {}", source.display()))?;
        let resolved = resolve(destination)
            .with_context(|| format!("invalid destination: {}", destination.display()))?;
        if resolved.starts_with(&source) {
            bail!(
                "destination {} is inside source {}",
                destination.display(),
                source.display()
            );
        }

        let jobs = self.collect_jobs(&source, destination)?;
        debug!(files = jobs.len(), "processing source tree");

        let outcomes = jobs
            .par_iter()
            .map(|job| self.process(job))
            .collect::<Result<Vec<_>>>()?;

        let mut summary = WriteSummary::default();
        for outcome in outcomes {
            match outcome {
                Outcome::Annotated(declarations) => {
                    summary.annotated_files += 1;
                    summary.declarations += declarations;
                }
                Outcome::Copied => summary.copied_files += 1,
            }
        }
        Ok(summary)
    }

    fn collect_jobs(&self, source: &Path, destination: &Path) -> Result<Vec<Job>> {
        fs::create_dir_all(destination)
            .with_context(|| format!("failed to create directory: {}", destination.display()))?;

        let mut jobs = Vec::new();
        for entry in WalkDir::new(source).min_depth(1).sort_by_file_name() {
            let entry = entry.with_context(|| format!("failed to walk {}", source.display()))?;
            let relative = entry.path().strip_prefix(source)?;
            let target = destination.join(relative);

            if entry.file_type().is_dir() {
                fs::create_dir_all(&target)
                    .with_context(|| format!("failed to create directory: {}", target.display()))?;
                continue;
            }

            let action = if self.should_annotate(relative) {
                Action::Annotate
            } else {
                Action::Copy
            };
            jobs.push(Job {
                source: entry.into_path(),
                target,
                action,
            });
        }
        Ok(jobs)
    }

    fn should_annotate(&self, relative: &Path) -> bool {
        let name = relative
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_default();
        name.ends_with(".java")
            && !self
                .config
                .skip
                .iter()
                .any(|pattern| pattern.matches(&name) || pattern.matches_path(relative))
    }

    fn process(&self, job: &Job) -> Result<Outcome> {
        match job.action {
            Action::Copy => {
                debug!(path = %job.source.display(), "copy");
                fs::copy(&job.source, &job.target).with_context(|| {
                    format!("failed to copy {} to {}", job.source.display(), job.target.display())
                })?;
                Ok(Outcome::Copied)
            }
            Action::Annotate => {
                debug!(path = %job.source.display(), "annotate");
                let src = fs::read_to_string(&job.source)
                    .with_context(|| format!("failed to read {}", job.source.display()))?;
                let unit = java::parse_with_fallback(&src, self.config.language)
                    .with_context(|| format!("failed to parse {}", job.source.display()))?;

                let annotated = self.annotator.annotate(&src, &unit);
                let output = match &self.config.formatter {
                    Some(formatter) => formatter.format(&job.source, &annotated.source)?,
                    None => annotated.source,
                };

                fs::write(&job.target, output)
                    .with_context(|| format!("failed to write {}", job.target.display()))?;
                Ok(Outcome::Annotated(annotated.declarations))
            }
        }
    }
}

/// Canonical form of a path that may not exist yet: its nearest existing
/// ancestor is canonicalized and the missing components appended.
fn resolve(path: &Path) -> std::io::Result<PathBuf> {
    let absolute = std::path::absolute(path)?;
    let mut existing = absolute.as_path();
    let mut missing = Vec::new();
    while !existing.exists() {
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name);
                existing = parent;
            }
            _ => break,
        }
    }
    let mut resolved = existing.canonicalize()?;
    resolved.extend(missing.iter().rev());
    Ok(resolved)
}

/// External command that reads Java source on stdin and prints the formatted
/// result on stdout, e.g. `google-java-format -`.
#[derive(Debug, Clone)]
pub struct SourceFormatter {
    program: String,
    args: Vec<String>,
}

impl SourceFormatter {
    /// Split a command line on whitespace. No quoting is supported.
    pub fn parse(command: &str) -> Result<Self> {
        let mut words = command.split_whitespace().map(str::to_string);
        let program = words.next().context("formatter command is empty")?;
        Ok(Self {
            program,
            args: words.collect(),
        })
    }

    /// Format `source` read from `path`. On failure the unformatted text is
    /// kept as `.failed.<file name>` in the working directory.
    pub fn format(&self, path: &Path, source: &str) -> Result<String> {
        match self.run(source) {
            Ok(formatted) => Ok(formatted),
            Err(err) => {
                let name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let failed = PathBuf::from(format!(".failed.{name}"));
                if let Err(write_err) = fs::write(&failed, source) {
                    warn!(path = %failed.display(), error = %write_err, "could not save unformatted source");
                }
                Err(err.context(format!(
                    "failed to format {} (unformatted source saved to {})",
                    path.display(),
                    failed.display()
                )))
            }
        }
    }

    fn run(&self, source: &str) -> Result<String> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to start formatter `{}`", self.program))?;
        let mut stdin = child.stdin.take().context("formatter stdin unavailable")?;

        // stdin is fed from a second thread so a large file cannot deadlock on full pipes
        let (written, output) = std::thread::scope(|s| {
            let feeder = s.spawn(move || stdin.write_all(source.as_bytes()));
            let output = child.wait_with_output();
            (feeder.join(), output)
        });
        let output = output.with_context(|| format!("failed to run formatter `{}`", self.program))?;

        if !output.status.success() {
            bail!(
                "formatter `{}` exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        match written {
            Ok(Ok(())) => {}
            Ok(Err(err)) => return Err(err).context("failed to write to formatter"),
            Err(_) => bail!("formatter input thread panicked"),
        }
        String::from_utf8(output.stdout).context("formatter printed invalid UTF-8")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const REGISTRY: &str = r#"<api version="3">
    <class name="a/b/Foo" since="21"/>
</api>"#;

    fn setup(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (path, content) in files {
            let path = dir.path().join("src").join(path);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        dir
    }

    fn config() -> WriterConfig {
        WriterConfig {
            language: LanguageLevel::Java11,
            formatter: None,
            skip: vec![glob::Pattern::new(DEFAULT_SKIP).unwrap()],
        }
    }

    #[test]
    fn mirrors_tree_and_annotates_java() {
        let dir = setup(&[
            ("a/b/Foo.java", "package a.b;\nclass Foo {}\n"),
            ("a/b/Foo.annotated.java", "not java at all {"),
            ("a/b/notes.txt", "plain"),
            ("a/empty/.keep", ""),
        ]);
        let index = RegistryIndex::parse(REGISTRY).unwrap();
        let out = dir.path().join("out");

        let summary = EnhanceWriter::new(&index, config())
            .write(&dir.path().join("src"), &out)
            .unwrap();

        assert_eq!(
            summary,
            WriteSummary {
                annotated_files: 1,
                copied_files: 3,
                declarations: 1,
            }
        );
        assert_eq!(
            fs::read_to_string(out.join("a/b/Foo.java")).unwrap(),
            "package a.b;\n/**\n * @since 5.0 Lollipop (21)\n */\nclass Foo {}\n"
        );
        assert_eq!(fs::read_to_string(out.join("a/b/Foo.annotated.java")).unwrap(), "not java at all {");
        assert_eq!(fs::read_to_string(out.join("a/b/notes.txt")).unwrap(), "plain");
        assert!(out.join("a/empty/.keep").is_file());
    }

    #[test]
    fn parse_failure_aborts() {
        let dir = setup(&[("Broken.java", "class {")]);
        let index = RegistryIndex::parse(REGISTRY).unwrap();
        let err = EnhanceWriter::new(&index, config())
            .write(&dir.path().join("src"), &dir.path().join("out"))
            .unwrap_err();
        assert!(format!("{err:#}").contains("Broken.java"));
    }

    #[test]
    fn refuses_destination_inside_source() {
        let dir = setup(&[("A.java", "class A {}")]);
        let index = RegistryIndex::parse(REGISTRY).unwrap();
        let src = dir.path().join("src");
        let err = EnhanceWriter::new(&index, config())
            .write(&src, &src.join("nested"))
            .unwrap_err();
        assert!(err.to_string().contains("inside source"));
        assert!(!src.join("nested").exists());
    }

    #[test]
    fn formatter_command_is_split() {
        let formatter = SourceFormatter::parse("  google-java-format --aosp -  ").unwrap();
        assert_eq!(formatter.program, "google-java-format");
        assert_eq!(formatter.args, vec!["--aosp", "-"]);
        assert!(SourceFormatter::parse("   ").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn formatter_output_replaces_source() {
        let formatter = SourceFormatter::parse("tr a-z A-Z").unwrap();
        assert_eq!(formatter.format(Path::new("X.java"), "class x {}").unwrap(), "CLASS X {}");
    }
}
