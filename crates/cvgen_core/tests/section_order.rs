use cvgen_core::repo::{DocumentRepository, FileDocumentRepository};
use cvgen_core::{
    AutosaveListener, Column, Document, MarkupGenerator, PersistDecision, SectionChange,
    SectionOrderer,
};

const RESUME: &str = "\
_order:
- experience
- skills
- education
name:
  first: Ada
  last: Lovelace
experience:
- position: Engineer
  company: Analytical Engines
  description: |-
    - Wrote the first program

    - Annotated the notes
skills:
- title: Mathematics
  left: true
education:
- degree: Tutoring
  institution: Home
";

fn open(dir: &tempfile::TempDir) -> (FileDocumentRepository, SectionOrderer) {
    let path = dir.path().join("resume.yaml");
    std::fs::write(&path, RESUME).unwrap();
    let repo = FileDocumentRepository::new(path);
    let orderer = SectionOrderer::from_loaded(repo.load_workspace().unwrap());
    (repo, orderer)
}

#[test]
fn persist_then_load_reconstructs_order_visible_data_and_hidden_sections() {
    let dir = tempfile::tempdir().unwrap();
    let (repo, mut orderer) = open(&dir);
    assert_eq!(orderer.order(), vec!["experience", "skills", "education", "name"]);

    let mut listener = AutosaveListener::new(repo.clone());
    let change = orderer.set_visible("experience", false).unwrap();
    assert_eq!(
        listener.on_change(&orderer, &change).unwrap(),
        PersistDecision::Persisted
    );
    let change = orderer.reorder("education", 0).unwrap();
    listener.on_change(&orderer, &change).unwrap();

    let reloaded = SectionOrderer::from_loaded(repo.load_workspace().unwrap());
    assert_eq!(reloaded.order(), orderer.order());
    assert_eq!(reloaded, orderer);

    let hidden = reloaded.get("experience").unwrap();
    assert!(!hidden.visible);
    assert_eq!(hidden, orderer.get("experience").unwrap());
}

#[test]
fn hidden_sections_are_inert_for_the_normal_parser() {
    let dir = tempfile::tempdir().unwrap();
    let (repo, mut orderer) = open(&dir);
    let mut listener = AutosaveListener::new(repo.clone());
    let change = orderer.set_visible("skills", false).unwrap();
    listener.on_change(&orderer, &change).unwrap();

    let raw = std::fs::read_to_string(repo.path()).unwrap();
    assert!(raw.contains("# skills:\n# - title: Mathematics\n#   left: true"));

    let document = repo.load().unwrap();
    assert!(!document.contains("skills"));
    assert_eq!(
        document.order().unwrap(),
        vec!["experience", "skills", "education", "name"]
    );

    let markup = MarkupGenerator::new("deedy").generate(&document).unwrap();
    assert_eq!(markup.section_names(), vec!["experience", "education"]);
}

#[test]
fn reshowing_a_hidden_section_restores_it_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let (repo, mut orderer) = open(&dir);
    let mut listener = AutosaveListener::new(repo.clone());

    for visible in [false, true] {
        let change = orderer.set_visible("skills", visible).unwrap();
        listener.on_change(&orderer, &change).unwrap();
    }
    let document = repo.load().unwrap();
    let markup = MarkupGenerator::new("deedy").generate(&document).unwrap();
    assert_eq!(markup.section_names(), vec!["skills", "experience", "education"]);
}

#[test]
fn explicit_column_survives_persistence() {
    let dir = tempfile::tempdir().unwrap();
    let (repo, mut orderer) = open(&dir);
    let mut listener = AutosaveListener::new(repo.clone());

    let change = orderer.set_column("skills", Some(Column::Right)).unwrap();
    assert!(matches!(change, SectionChange::ColumnChanged { .. }));
    listener.on_change(&orderer, &change).unwrap();

    let document: Document = repo.load().unwrap();
    assert_eq!(document.column_override("skills"), Some(Column::Right));
    let markup = MarkupGenerator::new("deedy").generate(&document).unwrap();
    assert!(markup.left.is_empty());
}

#[test]
fn removed_section_leaves_order_and_file() {
    let dir = tempfile::tempdir().unwrap();
    let (repo, mut orderer) = open(&dir);
    let mut listener = AutosaveListener::new(repo.clone());

    let change = orderer.remove("education").unwrap();
    listener.on_change(&orderer, &change).unwrap();

    let raw = std::fs::read_to_string(repo.path()).unwrap();
    assert!(!raw.contains("education"));
    assert!(!raw.contains("Tutoring"));
}
