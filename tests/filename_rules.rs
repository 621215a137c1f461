use docpress::util::{extension_of, pdf_download_name, secure_filename, storage_filename, tail_lossy};

#[test]
fn strips_path_traversal() {
    assert_eq!(secure_filename("../../etc/passwd.docx"), "etc_passwd.docx");
    assert_eq!(secure_filename("..\\..\\windows\\win.ini.doc"), "windows_win.ini.doc");
    assert!(!secure_filename("/abs/path/report.docx").contains('/'));
}

#[test]
fn joins_words_and_drops_unsafe_chars() {
    assert_eq!(secure_filename("My Quarterly Report.docx"), "My_Quarterly_Report.docx");
    assert_eq!(secure_filename("budget (final)!.docm"), "budget_final.docm");
    assert_eq!(secure_filename("Résumé.doc"), "Resume.doc");
}

#[test]
fn storage_name_keeps_validated_extension() {
    assert_eq!(storage_filename("Report.DOCX", "docx"), "Report.DOCX");
    assert_eq!(storage_filename("文档.docx", "docx"), "document.docx");
    assert_eq!(storage_filename("../.docx", "docx"), "document.docx");
}

#[test]
fn extension_is_text_after_last_dot() {
    assert_eq!(extension_of("a.b.docx"), Some("docx"));
    assert_eq!(extension_of("noext"), None);
    assert_eq!(extension_of("trailing."), Some(""));
}

#[test]
fn download_name_swaps_extension() {
    assert_eq!(pdf_download_name("My_Report.docx"), "My_Report.pdf");
    assert_eq!(pdf_download_name("archive.v2.doc"), "archive.v2.pdf");
}

#[test]
fn tail_keeps_the_end() {
    assert_eq!(tail_lossy(b"  short \n", 10), "short");
    assert_eq!(tail_lossy(b"0123456789", 4), "6789");
}
