use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use docx_replace::OccurrencePolicy;

/// Configuration for the docx-replace command line.
#[derive(Parser, Debug, Clone)]
#[command(name = "docx-replace")]
#[command(about = "Search and replace text in DOCX files, across formatting runs")]
#[command(version)]
pub struct Config {
    /// Log filter (overrides RUST_LOG), e.g. "debug" or "docx_replace=trace"
    #[arg(long, global = true, env = "DOCX_REPLACE_LOG_LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Replace text and write the edited document
    Replace(ReplaceArgs),
    /// Print the occurrences a replace would rewrite, as JSON
    Plan(PlanArgs),
    /// Print the body text runs, as JSON
    Fragments {
        input: PathBuf,
    },
    /// Print the package entries and their roles, as JSON
    Parts {
        input: PathBuf,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ReplaceArgs {
    pub input: PathBuf,
    pub output: PathBuf,

    /// Text to search for
    #[arg(long)]
    pub find: Option<String>,

    /// Replacement text
    #[arg(long = "replace", default_value = "", requires = "find")]
    pub replacement: String,

    #[command(flatten)]
    pub selection: Selection,

    #[command(flatten)]
    pub scope: Scope,

    /// Literal replacement over the raw body markup instead of following runs
    #[arg(long, conflicts_with_all = ["header", "footer", "link"])]
    pub raw: bool,

    /// Replace media slot N with the file at PATH (repeatable)
    #[arg(long = "image", value_name = "SLOT=PATH", value_parser = parse_image)]
    pub images: Vec<(u32, PathBuf)>,
}

#[derive(Args, Debug, Clone)]
pub struct PlanArgs {
    pub input: PathBuf,

    /// Text to search for
    #[arg(long)]
    pub find: String,

    #[command(flatten)]
    pub selection: Selection,
}

/// Which occurrences to rewrite. Defaults to all of them.
#[derive(Args, Debug, Clone, Default)]
pub struct Selection {
    /// Every occurrence
    #[arg(long, conflicts_with_all = ["first", "index"])]
    pub all: bool,

    /// Only the first N occurrences
    #[arg(long, value_name = "N", conflicts_with = "index")]
    pub first: Option<usize>,

    /// Only the K-th occurrence, counting from 0
    #[arg(long, value_name = "K")]
    pub index: Option<usize>,
}

impl Selection {
    pub fn policy(&self) -> OccurrencePolicy {
        if self.all {
            return OccurrencePolicy::All;
        }
        match (self.first, self.index) {
            (Some(n), _) => OccurrencePolicy::First(n),
            (None, Some(k)) => OccurrencePolicy::Exact(k),
            (None, None) => OccurrencePolicy::All,
        }
    }

    /// Limit for the literal modes; `-1` means unlimited.
    pub fn limit(&self) -> i64 {
        self.first.map_or(-1, |n| i64::try_from(n).unwrap_or(i64::MAX))
    }
}

/// Part the replacement is applied to. Defaults to the body.
#[derive(Args, Debug, Clone, Default)]
#[group(multiple = false)]
pub struct Scope {
    /// Every header part, every occurrence
    #[arg(long, conflicts_with_all = ["first", "index"])]
    pub header: bool,

    /// Every footer part, every occurrence
    #[arg(long, conflicts_with_all = ["first", "index"])]
    pub footer: bool,

    /// Document relationships (hyperlink targets); honours --first
    #[arg(long, conflicts_with = "index")]
    pub link: bool,
}

fn parse_image(value: &str) -> Result<(u32, PathBuf), String> {
    let (slot, path) = value
        .split_once('=')
        .ok_or_else(|| format!("expected SLOT=PATH, got '{}'", value))?;
    let slot = slot
        .parse()
        .map_err(|_| format!("invalid image slot '{}'", slot))?;
    if path.is_empty() {
        return Err("image path is empty".to_string());
    }
    Ok((slot, PathBuf::from(path)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse_replace(args: &[&str]) -> Result<Config, clap::Error> {
        let argv = ["docx-replace", "replace", "in.docx", "out.docx"]
            .iter()
            .chain(args)
            .copied();
        Config::try_parse_from(argv)
    }

    fn replace_args(args: &[&str]) -> ReplaceArgs {
        match parse_replace(args).unwrap().command {
            Command::Replace(args) => args,
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_default_policy_is_all() {
        let args = replace_args(&["--find", "a", "--replace", "b"]);
        assert_eq!(args.selection.policy(), OccurrencePolicy::All);
        assert_eq!(args.selection.limit(), -1);
        assert_eq!(args.replacement, "b");
    }

    #[test]
    fn test_first_and_index() {
        let first = replace_args(&["--find", "a", "--first", "2"]);
        assert_eq!(first.selection.policy(), OccurrencePolicy::First(2));
        assert_eq!(first.selection.limit(), 2);

        let index = replace_args(&["--find", "a", "--index", "3"]);
        assert_eq!(index.selection.policy(), OccurrencePolicy::Exact(3));
    }

    #[test]
    fn test_conflicting_selection_rejected() {
        let argv = ["--find", "a", "--first", "1", "--index", "2"];
        assert!(parse_replace(&argv).is_err());
    }

    #[test]
    fn test_scope_flags_are_exclusive() {
        let argv = ["--find", "a", "--header", "--footer"];
        assert!(parse_replace(&argv).is_err());
        assert!(replace_args(&["--find", "a", "--link"]).scope.link);
    }

    #[test]
    fn test_scopes_reject_selections_they_cannot_apply() {
        let rejected: [&[&str]; 5] = [
            &["--link", "--index", "0"],
            &["--header", "--first", "1"],
            &["--header", "--index", "1"],
            &["--footer", "--first", "2"],
            &["--footer", "--index", "0"],
        ];
        for extra in rejected {
            let argv: Vec<&str> = ["--find", "a"].iter().chain(extra).copied().collect();
            assert!(parse_replace(&argv).is_err(), "accepted {:?}", extra);
        }

        let link = replace_args(&["--find", "a", "--link", "--first", "1"]);
        assert_eq!(link.selection.limit(), 1);
        assert!(replace_args(&["--find", "a", "--header", "--all"]).scope.header);
    }

    #[test]
    fn test_images() {
        let args = replace_args(&["--image", "1=logo.png", "--image", "4=photo.jpg"]);
        assert_eq!(
            args.images,
            vec![
                (1, PathBuf::from("logo.png")),
                (4, PathBuf::from("photo.jpg"))
            ]
        );
        assert!(args.find.is_none());
    }

    #[test]
    fn test_parse_image_errors() {
        assert!(parse_image("logo.png").is_err());
        assert!(parse_image("x=logo.png").is_err());
        assert!(parse_image("2=").is_err());
    }
}
