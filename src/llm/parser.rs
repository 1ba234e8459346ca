//! Split raw completion text into ordered command candidates
//!
//! Models wrap commands in code fences, prompt markers and list numbering
//! no matter how firmly they are told not to. The cleaner strips that
//! formatting but keeps every remaining line in order; deciding whether a
//! line is actually a trusted command is the safety validator's job.

use crate::core::types::CommandCandidate;

/// Leading markers removed from each line, longest match first
const LINE_PREFIXES: [&str; 5] = ["output:", "command:", "commands:", "$ ", "> "];

/// Parse a completion into pending candidates, preserving order
pub fn parse_completion(text: &str) -> Vec<CommandCandidate> {
    text.lines()
        .filter_map(clean_line)
        .map(CommandCandidate::new)
        .collect()
}

/// Clean one line; `None` means the line carries no command
///
/// Cleaning repeats until nothing changes, so a cleaned line cleans to
/// itself.
pub fn clean_line(line: &str) -> Option<String> {
    let mut line = line.trim();

    // Marker prefixes can stack ("1. $ robo ...")
    loop {
        if is_noise(line) {
            return None;
        }
        let before = line;
        line = strip_list_marker(line);
        for prefix in LINE_PREFIXES {
            let head = line.get(..prefix.len());
            if head.is_some_and(|head| head.eq_ignore_ascii_case(prefix)) {
                line = line[prefix.len()..].trim_start();
            }
        }
        line = strip_inline_code(line).trim();
        if line == before {
            break;
        }
    }

    if line.ends_with(':') {
        return None;
    }
    Some(line.to_string())
}

/// Blank lines, fences, comments and bare language tags
fn is_noise(line: &str) -> bool {
    line.is_empty()
        || line.starts_with("```")
        || line.starts_with("//")
        || line.starts_with('#')
        || matches!(line, "bash" | "sh" | "shell" | "console")
}

/// Remove `1.`, `2)`, `-` or `*` list markers
fn strip_list_marker(line: &str) -> &str {
    if let Some(rest) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
        return rest.trim_start();
    }
    let digits = line.bytes().take_while(|b| b.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix(". ").or_else(|| rest.strip_prefix(") ")) {
            return rest.trim_start();
        }
    }
    line
}

/// Unwrap a line entirely enclosed in single backticks
fn strip_inline_code(line: &str) -> &str {
    line.strip_prefix('`')
        .and_then(|l| l.strip_suffix('`'))
        .filter(|inner| !inner.contains('`'))
        .unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(text: &str) -> Vec<String> {
        parse_completion(text).into_iter().map(|c| c.text).collect()
    }

    #[test]
    fn test_plain_lines_in_order() {
        assert_eq!(
            texts("robo gen node talker\nrobo sim launch webots\n"),
            vec!["robo gen node talker", "robo sim launch webots"]
        );
    }

    #[test]
    fn test_strips_code_fences_and_comments() {
        let completion = "```bash\n# generate first\nrobo gen node talker\n\n// then launch\nrobo sim launch gazebo\n```";
        assert_eq!(
            texts(completion),
            vec!["robo gen node talker", "robo sim launch gazebo"]
        );
    }

    #[test]
    fn test_strips_markers() {
        let completion = "Commands:\n1. `robo echo /scan`\n2) $ robo echo /odom\n- Output: robo node --list\n> ros2 topic list";
        assert_eq!(
            texts(completion),
            vec![
                "robo echo /scan",
                "robo echo /odom",
                "robo node --list",
                "ros2 topic list"
            ]
        );
    }

    #[test]
    fn test_keeps_unrecognized_lines_for_validation() {
        assert_eq!(
            texts("rm -rf /\nrobo sim status"),
            vec!["rm -rf /", "robo sim status"]
        );
    }

    #[test]
    fn test_language_tag_line_dropped() {
        assert_eq!(texts("bash\nrobo sim list"), vec!["robo sim list"]);
    }

    #[test]
    fn test_candidates_are_pending() {
        let candidates = parse_completion("robo sim status");
        assert_eq!(candidates.len(), 1);
        assert!(candidates[0].is_pending());
        assert_eq!(candidates[0].confidence, 0.0);
        assert_eq!(candidates[0].rejection_reason(), "");
    }

    #[test]
    fn test_empty_completion() {
        assert!(parse_completion("").is_empty());
        assert!(parse_completion("\n```\n```\n").is_empty());
    }

    #[test]
    fn test_unwrapped_comment_dropped() {
        assert_eq!(texts("`# start the sim`\n`robo sim launch gazebo`"), vec!["robo sim launch gazebo"]);
    }

    #[test]
    fn test_idempotent_on_identical_text() {
        let completion = "```\n1. robo sim launch gazebo\n2. robo echo /scan\n```";
        assert_eq!(parse_completion(completion), parse_completion(completion));
    }
}
