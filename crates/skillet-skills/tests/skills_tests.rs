#[cfg(test)]
mod tests {
    use skillet_skills::SkillRegistry;
    use std::path::Path;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "pdf/SKILL.md",
            "---\nname: PDF Processing\ndescription: Work with PDF files\n---\n# PDF\nUse pdftotext.\n",
        );
        write(dir.path(), "pdf/forms.md", "---\nkept: yes\n---\nForm filling notes.\n");
        write(
            dir.path(),
            "csv-report/SKILL.md",
            "---\nname: CSV Reports\ndescription: Summarize CSV data\n---\nSteps.\n",
        );
        dir
    }

    // ── Summaries ──────────────────────────────────────────────

    mod summaries {
        use super::*;

        #[test]
        fn entries_sorted_by_id_and_separated_by_blank_line() {
            let dir = fixture();
            let reg = SkillRegistry::discover_in(dir.path()).unwrap();
            let expected = "## CSV Reports\n\
                            **ID**: `csv-report`\n\
                            **Description**: Summarize CSV data\n\
                            \n\
                            ## PDF Processing\n\
                            **ID**: `pdf`\n\
                            **Description**: Work with PDF files\n";
            assert_eq!(reg.skill_summaries(), expected);
        }

        #[test]
        fn broken_skill_reports_error_inline() {
            let dir = fixture();
            write(dir.path(), "broken/SKILL.md", "no frontmatter here");
            let reg = SkillRegistry::discover_in(dir.path()).unwrap();
            let summaries = reg.skill_summaries();
            assert!(summaries.contains(
                "## broken\n**Error loading summary**: No frontmatter found in SKILL.md\n"
            ));
            // the good skills still render
            assert!(summaries.contains("**ID**: `pdf`"));
        }

        #[test]
        fn missing_name_and_description_use_placeholders() {
            let dir = tempfile::tempdir().unwrap();
            write(dir.path(), "bare/SKILL.md", "---\nauthor: someone\n---\n");
            let reg = SkillRegistry::discover_in(dir.path()).unwrap();
            assert_eq!(
                reg.skill_summaries(),
                "## Unknown\n**ID**: `bare`\n**Description**: No description\n"
            );
        }

        #[test]
        fn empty_dir_has_no_skills() {
            let dir = tempfile::tempdir().unwrap();
            let reg = SkillRegistry::discover_in(dir.path()).unwrap();
            assert_eq!(reg.skill_summaries(), "No skills available.");
        }
    }

    // ── Loading ────────────────────────────────────────────────

    mod loading {
        use super::*;

        #[test]
        fn skill_md_has_frontmatter_stripped() {
            let dir = fixture();
            let reg = SkillRegistry::discover_in(dir.path()).unwrap();
            assert_eq!(reg.load_skill("pdf", "SKILL.md"), "# PDF\nUse pdftotext.\n");
        }

        #[test]
        fn other_files_are_verbatim() {
            let dir = fixture();
            let reg = SkillRegistry::discover_in(dir.path()).unwrap();
            assert_eq!(
                reg.load_skill("pdf", "forms.md"),
                "---\nkept: yes\n---\nForm filling notes.\n"
            );
        }

        #[test]
        fn unknown_skill_lists_available() {
            let dir = fixture();
            let reg = SkillRegistry::discover_in(dir.path()).unwrap();
            assert_eq!(
                reg.load_skill("excel", "SKILL.md"),
                "Error: Skill 'excel' not found. Available skills: csv-report, pdf"
            );
        }

        #[test]
        fn missing_file() {
            let dir = fixture();
            let reg = SkillRegistry::discover_in(dir.path()).unwrap();
            assert_eq!(
                reg.load_skill("pdf", "reference.md"),
                "Error: File 'reference.md' not found in skill 'pdf'"
            );
        }

        #[test]
        fn paths_outside_the_skill_are_refused() {
            let dir = fixture();
            let reg = SkillRegistry::discover_in(dir.path()).unwrap();
            assert_eq!(
                reg.load_skill("pdf", "../csv-report/SKILL.md"),
                "Error: File '../csv-report/SKILL.md' not found in skill 'pdf'"
            );
            assert!(reg.load_skill("pdf", "/etc/passwd").starts_with("Error: File"));
        }

        #[test]
        fn non_utf8_file_reports_load_error() {
            let dir = fixture();
            std::fs::write(dir.path().join("pdf").join("blob.bin"), [0xff, 0xfe, 0x00]).unwrap();
            let reg = SkillRegistry::discover_in(dir.path()).unwrap();
            assert!(
                reg.load_skill("pdf", "blob.bin")
                    .starts_with("Error loading 'blob.bin' from skill 'pdf': ")
            );
        }
    }
}
