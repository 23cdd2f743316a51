//! Argument-list construction for the ffmpeg remux invocation.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use process_utils::DiscardStdioExt;
use raiplay_parser::Descriptor;

use crate::config::RemuxConfig;

/// Bitstream filter turning ADTS AAC from the HLS segments into MP4 AAC.
pub const AUDIO_BITSTREAM_FILTER: &str = "aac_adtstoasc";

/// A ready-to-spawn remux invocation.
///
/// Every value is a separate argument handed straight to the OS; no shell
/// ever re-parses the line, so titles and directories may contain spaces,
/// quotes or any other character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemuxCommand {
    program: String,
    args: Vec<OsString>,
    output_path: PathBuf,
}

impl RemuxCommand {
    pub fn new(config: &RemuxConfig, descriptor: &Descriptor, output_dir: &Path) -> Self {
        let output_path = output_dir.join(output_file_name(descriptor.title(), &config.extension));

        let overwrite = if config.overwrite { "-y" } else { "-n" };
        let mut args: Vec<OsString> = [
            "-hide_banner",
            overwrite,
            "-i",
            descriptor.content_url(),
            "-c",
            "copy",
            "-bsf:a",
            AUDIO_BITSTREAM_FILTER,
        ]
        .into_iter()
        .map(OsString::from)
        .collect();
        args.push(output_path.clone().into_os_string());

        Self {
            program: config.binary_path.clone(),
            args,
            output_path,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// The tokio command with all standard streams discarded.
    pub fn to_command(&self) -> tokio::process::Command {
        let mut cmd = process_utils::tokio_command(&self.program);
        cmd.args(self.args.iter().map(OsString::as_os_str))
            .discard_stdio();
        cmd
    }

    /// Value following `flag`, if present.
    pub fn flag_value(&self, flag: &str) -> Option<&OsStr> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|idx| self.args.get(idx + 1))
            .map(OsString::as_os_str)
    }
}

/// Title plus extension, with path separators and NULs replaced so the file
/// always lands directly inside the output directory.
fn output_file_name(title: &str, extension: &str) -> String {
    let base: String = title
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect();
    let base = match base.as_str() {
        "" | "." | ".." => "video".to_string(),
        _ => base,
    };
    let extension = extension.trim_start_matches('.');
    if extension.is_empty() {
        base
    } else {
        format!("{base}.{extension}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(title: &str) -> Descriptor {
        Descriptor::new(
            "https://www.raiplay.it/video/2021/05/ep.html",
            title,
            2,
            1,
            "https://mediapolis.rai.it/relinker/relinkerServlet.htm?cont=abc&output=64",
        )
        .unwrap()
    }

    /// Splits the argument list into option/value pairs and positionals the
    /// same way ffmpeg reads it.
    fn positionals(cmd: &RemuxCommand) -> Vec<OsString> {
        let mut out = Vec::new();
        let mut args = cmd.args().iter();
        while let Some(arg) = args.next() {
            match arg.to_str() {
                Some("-i") | Some("-bsf:a") => out.push(args.next().cloned().unwrap()),
                Some("-c") => {
                    args.next();
                }
                Some(flag) if flag.starts_with('-') => {}
                _ => out.push(arg.clone()),
            }
        }
        out
    }

    #[test]
    fn spaces_survive_as_single_arguments() {
        let dir = Path::new("/tmp/My Videos");
        let cmd = RemuxCommand::new(
            &RemuxConfig::default(),
            &descriptor("My Show: Part 2"),
            dir,
        );

        let positionals = positionals(&cmd);
        assert_eq!(positionals.len(), 3);
        assert_eq!(
            positionals[0],
            OsString::from(
                "https://mediapolis.rai.it/relinker/relinkerServlet.htm?cont=abc&output=64"
            )
        );
        assert_eq!(positionals[1], OsString::from(AUDIO_BITSTREAM_FILTER));
        assert_eq!(
            positionals[2],
            OsString::from("/tmp/My Videos/My Show: Part 2.mp4")
        );
    }

    #[test]
    fn follows_the_remux_template() {
        let cmd = RemuxCommand::new(
            &RemuxConfig::default().with_binary_path("ffmpeg"),
            &descriptor("Ep"),
            Path::new("out"),
        );
        assert_eq!(cmd.program(), "ffmpeg");
        assert_eq!(cmd.flag_value("-c"), Some(OsStr::new("copy")));
        assert_eq!(cmd.flag_value("-bsf:a"), Some(OsStr::new("aac_adtstoasc")));
        assert_eq!(cmd.args().last(), Some(&OsString::from("out/Ep.mp4")));
        assert!(cmd.args().iter().any(|a| a == "-n"));
    }

    #[test]
    fn overwrite_switches_flag() {
        let cmd = RemuxCommand::new(
            &RemuxConfig::default().with_overwrite(true),
            &descriptor("Ep"),
            Path::new("out"),
        );
        assert!(cmd.args().iter().any(|a| a == "-y"));
        assert!(!cmd.args().iter().any(|a| a == "-n"));
    }

    #[test]
    fn separators_in_titles_stay_in_the_output_dir() {
        let cmd = RemuxCommand::new(
            &RemuxConfig::default(),
            &descriptor("AC/DC \\ live"),
            Path::new("out"),
        );
        assert_eq!(cmd.output_path(), Path::new("out/AC_DC _ live.mp4"));
        assert_eq!(output_file_name("..", "mp4"), "video.mp4");
        assert_eq!(output_file_name("x", ".mkv"), "x.mkv");
    }
}
