use form_spec::{
    Choice, ConditionOperator, ConditionSet, Conditional, Description, Entity, EntityType, Node,
    NodeKind, Note, ParseError, Position, ProfileField, Question, QuestionType, Questionnaire,
    Section, Subsection, SyntheticIds, allocate_id, build_xml, find, insert_child,
    new_questionnaire, parse_xml, parse_xml_with,
};

const BAR_APPLICATION: &str = include_str!("fixtures/bar_application.xml");
const MALFORMED: &str = include_str!("fixtures/malformed.xml");
const WRONG_ROOT: &str = include_str!("fixtures/wrong_root.xml");

fn node<'a>(doc: &'a Questionnaire, id: &str) -> &'a Node {
    find(doc, id)
        .and_then(|found| found.as_node())
        .unwrap_or_else(|| panic!("node {id} missing"))
}

fn child_kinds(doc: &Questionnaire, id: &str) -> Vec<NodeKind> {
    node(doc, id).children().iter().map(Node::kind).collect()
}

#[test]
fn parses_fixture_attributes_and_text() {
    let doc = parse_xml(BAR_APPLICATION).expect("parse fixture");
    assert_eq!(doc.id, "148213");
    assert_eq!(doc.title, "Character and Fitness");
    assert_eq!(doc.suffix, "48213");
    assert_eq!(doc.next_id, 20);

    match node(&doc, "448213") {
        Node::Question(question) => {
            assert_eq!(question.kind, QuestionType::Char);
            assert!(question.required);
            assert_eq!(question.maxlength, 80);
            assert_eq!(question.refname, "full_name");
            assert_eq!(question.label(), Some("Full <strong>legal</strong> name"));
        }
        other => panic!("expected question, got {other:?}"),
    }
    match node(&doc, "648213") {
        Node::Reference(reference) => {
            assert_eq!(reference.table, "profile");
            assert_eq!(reference.field, ProfileField::FullName);
        }
        other => panic!("expected reference, got {other:?}"),
    }
    match node(&doc, "1448213") {
        Node::Entity(entity) => {
            assert_eq!(entity.kind, EntityType::AddMore);
            assert_eq!(entity.max, 10);
            assert_eq!(entity.min, 0);
            assert_eq!(entity.next_order, 1);
            assert!(entity.show_in_bar_admin);
        }
        other => panic!("expected entity, got {other:?}"),
    }
    match node(&doc, "1848213") {
        Node::Note(note) => {
            assert_eq!(note.text, "No other names & aliases");
            assert!(note.is_check_item);
        }
        other => panic!("expected note, got {other:?}"),
    }
    match node(&doc, "1948213") {
        Node::RequiredDoc(doc) => assert!(!doc.prevent_submit),
        other => panic!("expected required-doc, got {other:?}"),
    }
    match node(&doc, "1048213") {
        Node::Description(description) => {
            assert_eq!(description.text, "Have you ever been known by another name?");
        }
        other => panic!("expected description, got {other:?}"),
    }
}

#[test]
fn unknown_elements_are_skipped_and_missing_ids_synthesised() {
    let doc = parse_xml(BAR_APPLICATION).expect("parse fixture");
    assert_eq!(
        child_kinds(&doc, "348213"),
        [
            NodeKind::Question,
            NodeKind::Warning,
            NodeKind::ConditionSet,
            NodeKind::IncludeForm,
        ]
    );
    match node(&doc, "node_1") {
        Node::IncludeForm(include) => {
            assert_eq!(include.form_name, "employment");
            assert_eq!(include.kind, "online");
            assert!(include.multiple_include);
            assert!(!include.required);
        }
        other => panic!("expected includeform, got {other:?}"),
    }
    assert!(find(&doc, "999").is_none());
}

#[test]
fn synthetic_ids_come_from_the_caller() {
    let mut ids = SyntheticIds::starting_at(100);
    let doc = parse_xml_with(BAR_APPLICATION, &mut ids).expect("parse fixture");
    assert!(find(&doc, "node_100").is_some());
    assert_eq!(ids.issued(), 101);

    let again = parse_xml(BAR_APPLICATION).expect("parse fixture");
    assert_eq!(again, parse_xml(BAR_APPLICATION).expect("parse fixture"));
}

#[test]
fn bare_root_takes_defaults() {
    let doc = parse_xml("<questionnaire/>").expect("parse");
    assert_eq!(doc.id, "node_1");
    assert_eq!(doc.title, "Untitled Form");
    assert_eq!(doc.suffix, "");
    assert_eq!(doc.next_id, 1);
    assert!(doc.children.is_empty());
}

#[test]
fn zero_next_id_reads_as_one() {
    let doc = parse_xml(r#"<questionnaire id="148213" nextid="0"/>"#).expect("parse");
    assert_eq!(doc.next_id, 1);
}

#[test]
fn unknown_attribute_entities_are_kept_literally() {
    let doc = parse_xml(
        r#"<questionnaire id="1" title="Bar&nbsp;Form" nextid="3">
            <section id="2" title="Fish &amp; chips&hellip;"/>
        </questionnaire>"#,
    )
    .expect("parse");
    assert_eq!(doc.title, "Bar&nbsp;Form");
    match node(&doc, "2") {
        Node::Section(section) => assert_eq!(section.title, "Fish & chips&hellip;"),
        other => panic!("expected section, got {other:?}"),
    }
    assert_eq!(parse_xml(&build_xml(&doc)).expect("reparse"), doc);
}

#[test]
fn lenient_attribute_coercion() {
    let doc = parse_xml(
        r#"<questionnaire id="1" nextid="12abc">
            <section id="2" showinbaradmin="no">
                <subsection id="3" showinbaradmin="false">
                    <question id="4" required="TRUE" maxlength="wide"/>
                    <conditionset id="5">
                        <conditional id="6"/>
                    </conditionset>
                </subsection>
            </section>
        </questionnaire>"#,
    )
    .expect("parse");
    assert_eq!(doc.next_id, 12);
    match node(&doc, "2") {
        Node::Section(section) => assert!(section.show_in_bar_admin),
        other => panic!("expected section, got {other:?}"),
    }
    match node(&doc, "3") {
        Node::Subsection(subsection) => assert!(!subsection.show_in_bar_admin),
        other => panic!("expected subsection, got {other:?}"),
    }
    match node(&doc, "4") {
        Node::Question(question) => {
            assert!(!question.required);
            assert_eq!(question.maxlength, 0);
            assert_eq!(question.kind, QuestionType::Char);
        }
        other => panic!("expected question, got {other:?}"),
    }
    match node(&doc, "5") {
        Node::ConditionSet(set) => assert_eq!(set.operator, ConditionOperator::And),
        other => panic!("expected conditionset, got {other:?}"),
    }
    match node(&doc, "6") {
        Node::Conditional(conditional) => assert_eq!(conditional.condition, "true"),
        other => panic!("expected conditional, got {other:?}"),
    }
}

#[test]
fn parse_failures_are_reported() {
    assert!(matches!(parse_xml(MALFORMED), Err(ParseError::Malformed(_))));
    assert_eq!(parse_xml(WRONG_ROOT), Err(ParseError::MissingRoot));
    assert_eq!(parse_xml(""), Err(ParseError::MissingRoot));
}

#[test]
fn fixture_round_trips() {
    let doc = parse_xml(BAR_APPLICATION).expect("parse fixture");
    let rebuilt = parse_xml(&build_xml(&doc)).expect("reparse");
    assert_eq!(rebuilt, doc);
}

#[test]
fn output_is_compact_and_indented() {
    let doc = parse_xml(BAR_APPLICATION).expect("parse fixture");
    let xml = build_xml(&doc);
    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert!(xml.contains("\n    <section id=\"248213\" title=\"Personal History\">"));
    assert!(xml.contains("<![CDATA[No other names & aliases]]>"));
    assert!(!xml.contains("isamended"));
    assert!(!xml.contains("hologram"));
}

fn built_document() -> Questionnaire {
    let mut doc = new_questionnaire("Built", Some("77777")).expect("doc");
    let section_id = allocate_id(&mut doc);
    let subsection_id = allocate_id(&mut doc);
    let first_id = allocate_id(&mut doc);
    let note_id = allocate_id(&mut doc);
    let second_id = allocate_id(&mut doc);
    let set_id = allocate_id(&mut doc);
    let branch_id = allocate_id(&mut doc);
    let option_id = allocate_id(&mut doc);

    let doc = insert_child(
        &doc,
        &doc.id.clone(),
        Node::Section(Section {
            id: section_id.clone(),
            title: "Education".into(),
            show_in_bar_admin: false,
            children: vec![Node::Subsection(Subsection {
                id: subsection_id.clone(),
                title: "Law School".into(),
                show_in_bar_admin: true,
                children: Vec::new(),
            })],
        }),
        Position::End,
    )
    .expect("section");
    let doc = insert_child(
        &doc,
        &subsection_id,
        Node::Question(Question {
            id: first_id,
            kind: QuestionType::Radio,
            trigger_value: "yes".into(),
            children: vec![Node::Choice(Choice {
                id: option_id,
                value: "yes".into(),
                text: "Yes ]]> really".into(),
            })],
            ..Question::default()
        }),
        Position::End,
    )
    .expect("question");
    let doc = insert_child(
        &doc,
        &subsection_id,
        Node::Note(Note {
            id: note_id,
            text: "  padded  ".into(),
            is_check_item: false,
        }),
        Position::End,
    )
    .expect("note");
    let doc = insert_child(
        &doc,
        &subsection_id,
        Node::Question(Question {
            id: second_id,
            kind: QuestionType::Other("custom_widget".into()),
            children: vec![Node::Description(Description {
                id: "desc-x".into(),
                prefix: "1.".into(),
                text: "<em>Graduated?</em>".into(),
            })],
            ..Question::default()
        }),
        Position::End,
    )
    .expect("second question");
    insert_child(
        &doc,
        &subsection_id,
        Node::ConditionSet(ConditionSet {
            id: set_id,
            operator: ConditionOperator::Switch,
            children: vec![Node::Conditional(Conditional {
                id: branch_id,
                condition: String::new(),
                children: vec![Node::Entity(Entity {
                    id: "entity-x".into(),
                    title: String::new(),
                    kind: EntityType::Single,
                    min: 1,
                    max: 0,
                    next_order: 3,
                    show_in_bar_admin: false,
                    is_amended: true,
                    group_type: "employment".into(),
                    ncbe_name: String::new(),
                    ncbe_value: String::new(),
                    ilg_name: "ilg".into(),
                    ilg_value: String::new(),
                    children: Vec::new(),
                })],
            })],
        }),
        Position::End,
    )
    .expect("conditionset")
}

#[test]
fn documents_built_by_edits_round_trip_up_to_group_order() {
    let doc = built_document();
    let rebuilt = parse_xml(&build_xml(&doc)).expect("reparse");

    assert_eq!(rebuilt.id, doc.id);
    assert_eq!(rebuilt.next_id, doc.next_id);
    let subsection_id = doc.children[0].children()[0].id().to_string();
    // The note is emitted after both questions, since siblings are grouped by tag.
    assert_eq!(
        child_kinds(&rebuilt, &subsection_id),
        [
            NodeKind::Question,
            NodeKind::Question,
            NodeKind::Note,
            NodeKind::ConditionSet,
        ]
    );

    let mut expected = doc.clone();
    if let Some(Node::Section(section)) = expected.children.first_mut()
        && let Some(Node::Subsection(subsection)) = section.children.first_mut()
    {
        subsection.children.swap(1, 2);
    }
    assert_eq!(rebuilt, expected);
}
