use docpress::job::ConversionJob;

#[test]
fn same_filename_gets_distinct_paths() {
    let dir = tempfile::tempdir().unwrap();
    let a = ConversionJob::new(dir.path(), "report.docx");
    let b = ConversionJob::new(dir.path(), "report.docx");
    assert_ne!(a.id(), b.id());
    assert_ne!(a.input(), b.input());
    assert_ne!(a.output(), b.output());
    assert!(a.input().starts_with(dir.path()));
    assert!(a.output().to_string_lossy().ends_with(&format!("{}.pdf", a.id())));
}

#[test]
fn drop_removes_job_files_and_leftovers() {
    let dir = tempfile::tempdir().unwrap();
    let unrelated = dir.path().join("keep-me.txt");
    std::fs::write(&unrelated, b"x").unwrap();

    {
        let job = ConversionJob::new(dir.path(), "report.docx");
        job.write_input(b"doc").unwrap();
        std::fs::write(job.output(), b"%PDF").unwrap();
        let id = job.id();
        std::fs::write(dir.path().join(format!("{id}_report.pdf")), b"%PDF").unwrap();
        std::fs::write(dir.path().join(format!(".~lock.{id}_report.docx#")), b"").unwrap();
    }

    let left: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .flatten()
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(left, vec!["keep-me.txt"]);
}

#[test]
fn drop_tolerates_missing_files() {
    let dir = tempfile::tempdir().unwrap();
    let job = ConversionJob::new(dir.path(), "report.docx");
    drop(job);

    let gone = tempfile::tempdir().unwrap();
    let path = gone.path().to_path_buf();
    drop(gone);
    drop(ConversionJob::new(&path, "report.docx"));
}

#[test]
fn drop_runs_while_unwinding() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().to_path_buf();
    let result = std::panic::catch_unwind(move || {
        let job = ConversionJob::new(&path, "report.docx");
        job.write_input(b"doc").unwrap();
        panic!("converter blew up");
    });
    assert!(result.is_err());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
