use cvgen_core::repo::{recover_hidden_sections, write_atomic};
use cvgen_core::{
    Document, DocumentRepository, FileDocumentRepository, RepoError, SectionOrderer,
};

#[test]
fn save_then_load_keeps_order_key_and_key_order() {
    let dir = tempfile::tempdir().unwrap();
    let repo = FileDocumentRepository::new(dir.path().join("resume.yaml"));
    let document = Document::parse(
        "_order: [skills, awards]\ncls: deedy\nawards: [Prize]\nskills: [{title: Rust}]\n",
    )
    .unwrap();

    repo.save(&document).unwrap();
    let loaded = repo.load().unwrap();
    assert_eq!(loaded, document);
    assert_eq!(
        loaded.keys().collect::<Vec<_>>(),
        vec!["_order", "cls", "awards", "skills"]
    );
    assert_eq!(loaded.order().unwrap(), vec!["skills", "awards"]);
}

#[test]
fn malformed_file_fails_strict_load_with_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("resume.yaml");
    std::fs::write(&path, "skills: [unclosed\n").unwrap();
    let repo = FileDocumentRepository::new(&path);

    let error = repo.load().expect_err("malformed text must fail");
    assert!(matches!(error, RepoError::Document { .. }));
    assert!(error.to_string().contains("resume.yaml"));
    assert!(repo.load_workspace().is_err());
}

#[test]
fn missing_file_message_asks_for_a_data_file() {
    let dir = tempfile::tempdir().unwrap();
    let repo = FileDocumentRepository::new(dir.path().join("none.yaml"));
    let error = repo.load().unwrap_err();
    assert!(error
        .to_string()
        .ends_with("not found. Please provide a data file."));
}

#[test]
fn workspace_load_only_recovers_ordered_hidden_sections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("resume.yaml");
    std::fs::write(
        &path,
        "_order: [skills, awards]\n\n# skills:\n# - Rust\n\n# hobbies:\n# - chess\n\n# awards: [shadowed]\nawards: [Prize]\n",
    )
    .unwrap();
    let repo = FileDocumentRepository::new(&path);

    assert_eq!(recover_hidden_sections(&std::fs::read_to_string(&path).unwrap()).len(), 3);
    let loaded = repo.load_workspace().unwrap();
    let names: Vec<_> = loaded.hidden.iter().map(|h| h.name.as_str()).collect();
    assert_eq!(names, vec!["skills"]);
    assert!(loaded.document.contains("awards"));
}

#[test]
fn atomic_write_replaces_whole_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("resume.yaml");
    write_atomic(&path, b"a: [1]\nb: [2]\n").unwrap();
    write_atomic(&path, b"a: [3]\n").unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "a: [3]\n");
}

#[test]
fn hidden_section_under_a_user_comment_survives_the_next_save() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("resume.yaml");
    std::fs::write(
        &path,
        "_order: [skills, awards]\n\n# keep this for later\n# skills:\n# - Rust\n\nawards: [Prize]\n",
    )
    .unwrap();
    let repo = FileDocumentRepository::new(&path);

    let orderer = SectionOrderer::from_loaded(repo.load_workspace().unwrap());
    assert_eq!(orderer.order(), vec!["skills", "awards"]);
    assert!(!orderer.get("skills").unwrap().visible);

    repo.save_raw(&orderer.render_persisted().unwrap()).unwrap();
    let saved = std::fs::read_to_string(&path).unwrap();
    assert!(saved.contains("# skills:\n# - Rust"));
    assert_eq!(
        repo.load().unwrap().order().unwrap(),
        vec!["skills", "awards"]
    );
}
