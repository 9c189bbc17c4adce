//! Label dictionaries for vocabulary grouping codes
//!
//! Both standards-body vocabularies carry subjects and education levels
//! as short codes on grouping nodes, not as display text. Codes resolve
//! here to the label stored on each outcome; an unknown code is a
//! document error, never passed through verbatim.

pub(crate) const SUBJECTS: &[(&str, &str)] = &[
    ("arts", "Arts"),
    ("engLang", "English Language Arts"),
    ("forLang", "World Languages"),
    ("health", "Health Education"),
    ("math", "Mathematics"),
    ("phyEd", "Physical Education"),
    ("sci", "Science"),
    ("socStudies", "Social Studies"),
    ("tech", "Technology"),
];

pub(crate) const EDU_LEVELS: &[(&str, &str)] = &[
    ("Pre-K", "Pre-Kindergarten"),
    ("K", "Kindergarten"),
    ("1", "Grade 1"),
    ("2", "Grade 2"),
    ("3", "Grade 3"),
    ("4", "Grade 4"),
    ("5", "Grade 5"),
    ("6", "Grade 6"),
    ("7", "Grade 7"),
    ("8", "Grade 8"),
    ("9", "Grade 9"),
    ("10", "Grade 10"),
    ("11", "Grade 11"),
    ("12", "Grade 12"),
];

pub(crate) fn subject_label(code: &str) -> Option<&'static str> {
    SUBJECTS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, label)| *label)
}

pub(crate) fn edulevel_label(code: &str) -> Option<&'static str> {
    EDU_LEVELS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, label)| *label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_known_codes_when_looking_up_then_labels_returned() {
        assert_eq!(subject_label("math"), Some("Mathematics"));
        assert_eq!(edulevel_label("K"), Some("Kindergarten"));
        assert_eq!(edulevel_label("12"), Some("Grade 12"));
    }

    #[test]
    fn given_unknown_code_when_looking_up_then_none() {
        assert_eq!(subject_label("astrology"), None);
        assert_eq!(edulevel_label("13"), None);
    }
}
