//! Ubuntu CVE tracker record parsing.
//!
//! Tracker records are RFC822-like: `Field: value` lines, with multi-line
//! values continued on indented lines.
//!
//! ```text
//! PublicDate: 2023-06-28 21:15:00 UTC
//! Description:
//!  A use-after-free flaw was found in the Linux kernel's netfilter ...
//! Ubuntu-Description:
//! Notes:
//!  sbeattie> ...
//! Priority: medium
//! ```

/// The parts of a tracker record the report needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CveMetadata {
    /// Ubuntu-specific description when present, otherwise the generic one
    pub description: String,
    pub priority: Option<String>,
    pub public_date: Option<String>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Description,
    UbuntuDescription,
}

/// Parse tracker record lines. The first occurrence of each field wins.
///
/// `Description:` runs up to the `Ubuntu-Description:` line and
/// `Ubuntu-Description:` runs up to the `Notes` line. Every line in between
/// belongs to the description, indented or not.
#[must_use]
pub fn parse_cve_metadata<S: AsRef<str>>(lines: &[S]) -> CveMetadata {
    let mut generic: Vec<String> = Vec::new();
    let mut ubuntu: Vec<String> = Vec::new();
    let mut seen_generic = false;
    let mut seen_ubuntu = false;
    let mut priority = None;
    let mut public_date = None;
    let mut section = Section::None;

    for line in lines {
        let line = line.as_ref();

        match section {
            Section::Description if !line.starts_with("Ubuntu-Description:") => {
                push_text(&mut generic, line);
                continue;
            }
            Section::UbuntuDescription if !line.starts_with("Notes") => {
                push_text(&mut ubuntu, line);
                continue;
            }
            _ => section = Section::None,
        }

        if let Some(rest) = line.strip_prefix("Ubuntu-Description:") {
            if !seen_ubuntu {
                seen_ubuntu = true;
                section = Section::UbuntuDescription;
                push_text(&mut ubuntu, rest);
            }
        } else if let Some(rest) = line.strip_prefix("Description:") {
            if !seen_generic {
                seen_generic = true;
                section = Section::Description;
                push_text(&mut generic, rest);
            }
        } else if let Some(rest) = line.strip_prefix("Priority:") {
            if priority.is_none() {
                priority = Some(rest.trim().to_string());
            }
        } else if let Some(rest) = line.strip_prefix("PublicDate:") {
            if public_date.is_none() {
                public_date = Some(rest.trim().to_string());
            }
        }
    }

    let description = if ubuntu.is_empty() {
        generic.join(" ")
    } else {
        ubuntu.join(" ")
    };

    CveMetadata {
        description,
        priority: priority.filter(|p| !p.is_empty()),
        public_date: public_date.filter(|d| !d.is_empty()),
    }
}

fn push_text(target: &mut Vec<String>, text: &str) {
    let text = text.trim();
    if !text.is_empty() {
        target.push(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECORD: &str = "\
Candidate: CVE-2023-3390
PublicDate: 2023-06-28 21:15:00 UTC
References:
 https://www.cve.org/CVERecord?id=CVE-2023-3390
Description:
 A use-after-free vulnerability was found in the Linux kernel's
 netfilter subsystem.
Ubuntu-Description:
Notes:
 sbeattie> introduced in 5.9
Priority: high
Priority_linux: medium
";

    fn lines(text: &str) -> Vec<&str> {
        text.lines().collect()
    }

    #[test]
    fn test_generic_description_when_ubuntu_empty() {
        let meta = parse_cve_metadata(&lines(RECORD));
        assert_eq!(
            meta.description,
            "A use-after-free vulnerability was found in the Linux kernel's netfilter subsystem."
        );
        assert_eq!(meta.priority.as_deref(), Some("high"));
        assert_eq!(meta.public_date.as_deref(), Some("2023-06-28 21:15:00 UTC"));
    }

    #[test]
    fn test_ubuntu_description_preferred() {
        let text = "Description:\n generic text\nUbuntu-Description:\n ubuntu text\n more\nNotes:\n ignored\n";
        let meta = parse_cve_metadata(&lines(text));
        assert_eq!(meta.description, "ubuntu text more");
    }

    #[test]
    fn test_first_priority_wins() {
        let meta = parse_cve_metadata(&lines("Priority: low\nPriority: critical\n"));
        assert_eq!(meta.priority.as_deref(), Some("low"));
    }

    #[test]
    fn test_notes_not_part_of_description() {
        let meta = parse_cve_metadata(&lines(RECORD));
        assert!(!meta.description.contains("sbeattie"));
    }

    #[test]
    fn test_description_runs_to_ubuntu_description_marker() {
        let text = "Description:\n indented start\nunindented middle\n\nUbuntu-Description:\nNotes:\nPriority: low\n";
        let meta = parse_cve_metadata(&lines(text));
        assert_eq!(meta.description, "indented start unindented middle");
        assert_eq!(meta.priority.as_deref(), Some("low"));
    }

    #[test]
    fn test_ubuntu_description_runs_to_notes_marker() {
        let text = "Ubuntu-Description:\n first\nBugs:\nNotes: none\nPriority: medium\n";
        let meta = parse_cve_metadata(&lines(text));
        assert_eq!(meta.description, "first Bugs:");
        assert_eq!(meta.priority.as_deref(), Some("medium"));
    }

    #[test]
    fn test_empty_record() {
        let meta = parse_cve_metadata::<&str>(&[]);
        assert_eq!(meta, CveMetadata::default());
    }
}
