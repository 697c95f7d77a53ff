use cvgen_core::markup::{render_blocks, Block, ListStyle};
use cvgen_core::{Document, MarkupError, MarkupGenerator};

fn generate(text: &str) -> cvgen_core::Markup {
    let document = Document::parse(text).unwrap();
    MarkupGenerator::new("deedy").generate(&document).unwrap()
}

fn body_text(blocks: &[Block]) -> String {
    let mut out = String::new();
    render_blocks(blocks, &mut out);
    out
}

#[test]
fn natural_key_order_without_order_list() {
    let markup = generate(
        "skills: [{title: Python}]\nexperience: [{company: Y}]\neducation: [{institution: X}]\nname: {first: A, last: B}\ncontact: {email: a@b.com}\n",
    );
    assert_eq!(markup.section_names(), vec!["skills", "experience", "education"]);
}

#[test]
fn order_list_is_followed_then_unlisted_sections_appended() {
    let markup = generate(
        "_order: [skills, education]\nexperience: [{company: Y}]\neducation: [{degree: BSc}]\nskills: [{title: Python}]\nname: {first: A, last: B}\n",
    );
    assert_eq!(markup.section_names(), vec!["skills", "education", "experience"]);
}

#[test]
fn first_item_flag_alone_decides_column() {
    let markup = generate(
        "skills: [{title: Python, left: true}, {title: Go}]\nexperience: [{company: Y}, {company: Z, left: true}]\nlanguages: [English]\n",
    );
    let left: Vec<_> = markup.left.iter().map(|s| s.name.as_str()).collect();
    let right: Vec<_> = markup.right.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(left, vec!["skills"]);
    assert_eq!(right, vec!["experience", "languages"]);
}

#[test]
fn generation_is_byte_identical_across_runs() {
    let text = "_order: [projects]\nname: Ada Lovelace\ncontact: {email: ada@x.io, github: 'https://github.com/ada'}\nprojects:\n- project: Engine\n  url: 'https://e.io'\n  description: |\n    - Designed it\n    carefully\n    - Shipped it\n  technologies: [Rust]\n";
    let document = Document::parse(text).unwrap();
    let generator = MarkupGenerator::new("deedy");
    let first = generator.generate(&document).unwrap().to_latex();
    let second = generator.generate(&document).unwrap().to_latex();
    assert_eq!(first, second);
}

#[test]
fn reserved_characters_and_links_in_content() {
    let markup = generate(
        "notes:\n- title: Misc\n  description: '100% & $5 #1 {x} _y [See](http://x.com)'\n",
    );
    let body = body_text(&markup.right[0].body);
    assert!(body.contains(r"100\% \& \$5 \#1 \{x\} \_y \href{http://x.com}{See}"));
}

#[test]
fn bullet_content_groups_continuation_lines() {
    let markup = generate(
        "experience:\n- position: Dev\n  company: Acme\n  description: \"- First point\\ncontinued\\n- Second point\"\n",
    );
    let list = markup.right[0]
        .body
        .iter()
        .find_map(|block| match block {
            Block::List { style, entries } => Some((*style, entries.clone())),
            _ => None,
        })
        .expect("bullet list block");
    assert_eq!(list.0, ListStyle::Bullet);
    assert_eq!(
        list.1,
        vec![
            vec![Block::Text("First point continued".to_string())],
            vec![Block::Text("Second point".to_string())],
        ]
    );
}

#[test]
fn metadata_order_is_fixed_regardless_of_source_order() {
    let markup = generate("projects:\n- title: P\n  url: 'http://p.io'\n  dates: '2024'\n");
    let body = body_text(&markup.right[0].body);
    assert!(body.contains(r"\location{2024 ~|~ \href{http://p.io}{Link}}"));
}

#[test]
fn header_renders_name_and_contact_line() {
    let markup = generate(
        "name: {first: Ada, last: Lovelace}\ncontact: {phone: '123', email: ada@x.io, website: 'https://www.ada.dev'}\n",
    );
    let latex = markup.to_latex();
    assert!(latex.contains(
        r"\namesection{Ada}{Lovelace}{\href{mailto:ada@x.io}{\faEnvelope\ ada@x.io} | \faPhone\ 123 | \href{https://www.ada.dev}{\faGlobe\ ada.dev}}"
    ));
}

#[test]
fn unusable_item_fails_whole_run_with_section_name() {
    let document = Document::parse(
        "skills: [{title: Python}]\nprojects:\n- title: P\n  description: {not: valid}\n",
    )
    .unwrap();
    let error = MarkupGenerator::new("deedy")
        .generate(&document)
        .expect_err("mapping content must fail");
    let MarkupError::Section { section, .. } = &error;
    assert_eq!(section, "projects");
    assert!(error.to_string().contains("description"));
}

#[test]
fn content_lists_nest_inside_nested_items() {
    let markup = generate(
        "projects:\n- project: OSS\n  contribution:\n  - title: Patch\n    details:\n    - title: Review\n      description: Added tests\n",
    );
    let body = body_text(&markup.right[0].body);
    assert_eq!(body.matches(r"\begin{enumerate}[label=-,leftmargin=*]").count(), 2);
    assert_eq!(body.matches(r"\begin{minipage}{\linewidth}").count(), 2);
    let outer = body.find(r"\runsubsection{Patch}").expect("outer nested item");
    let inner = body.find(r"\runsubsection{Review}").expect("inner nested item");
    assert!(outer < inner);
    assert!(body.contains("Added tests"));
}

#[test]
fn empty_content_list_renders_nothing() {
    let markup = generate(
        "projects:\n- title: P\n  company: C\n  description: []\n  details: ignored\n",
    );
    let body = body_text(&markup.right[0].body);
    assert!(!body.contains("enumerate"));
    assert!(!body.contains("ignored"));
    assert!(body.contains(r"\descript{C}"));
}
