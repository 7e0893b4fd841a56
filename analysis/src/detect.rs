//! Editable-surface detection and purpose classification.
//!
//! Detection walks the document once in pre-order, assigning each element a
//! stable [`InputId`] (its pre-order position). Running detection twice on
//! the same snapshot therefore yields identical ids and classifications -
//! records are replaced wholesale, never patched.
//!
//! Purpose classification is a declarative table of keyword rules evaluated
//! in fixed priority order over the element's joined descriptive text
//! (placeholder, labels, aria attributes, class tokens, ancestor container
//! classes). Platform-specific editor markers (rich-text editors, messaging
//! composers, chat prompt boxes) are part of the same tables.

use std::fmt;
use std::sync::LazyLock;

use aho_corasick::AhoCorasick;
use regex::Regex;
use scraper::{ElementRef, Selector};
use serde::Serialize;

use sidekick_types::InputPurpose;

use crate::PageSnapshot;

/// Stable identity of an element within one snapshot: its pre-order index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct InputId(pub usize);

impl fmt::Display for InputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "input-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Form,
    Standalone,
}

/// One detected editable surface. Lifetime bounded by the snapshot that
/// produced it; navigation resets everything.
#[derive(Debug, Clone, Serialize)]
pub struct DetectedInput {
    pub id: InputId,
    pub kind: InputKind,
    pub purpose: InputPurpose,
    /// Human-readable field label for prompt headers.
    pub label: String,
    /// Constituent editable elements (the surface itself for standalone).
    pub fields: Vec<InputId>,
    pub has_long_text: bool,
    pub is_relevant: bool,
}

/// Class tokens used by rich-text and messaging editors.
const EDITOR_CLASS_MARKERS: &[&str] = &[
    "msg-form__contenteditable",
    "ql-editor",
    "public-drafteditor-content",
    "editor-content",
    "prosemirror",
    "message-editor",
    "compose-text",
    "messaging-text",
];

/// Keywords in a placeholder or name that make a plain text input relevant.
const RELEVANT_TEXT_KEYWORDS: &[&str] =
    &["comment", "message", "tweet", "post", "write", "type"];

/// Purpose rules for standalone surfaces, highest priority first.
const STANDALONE_PURPOSE_KEYWORDS: &[(InputPurpose, &[&str])] = &[
    (
        InputPurpose::MessageComposition,
        &["write a message", "type a message", "msg-form"],
    ),
    (
        InputPurpose::AiChat,
        &[
            "ask anything",
            "message chatgpt",
            "prosemirror",
            "prompt-textarea",
            "unified-composer",
        ],
    ),
    (
        InputPurpose::SocialPost,
        &["tweet", "what's happening", "post your reply"],
    ),
    (InputPurpose::Search, &["search"]),
    (InputPurpose::Comment, &["comment", "reply"]),
    (InputPurpose::MessageComposition, &["message", "chat"]),
    (InputPurpose::ReviewWriting, &["review"]),
    (InputPurpose::Bio, &["bio", "about"]),
];

/// Purpose rules for whole forms, evaluated over label and placeholder text.
const FORM_PURPOSE_KEYWORDS: &[(InputPurpose, &[&str])] = &[
    (
        InputPurpose::MessageComposition,
        &["message", "comment", "feedback"],
    ),
    (InputPurpose::ReviewWriting, &["review", "rating"]),
    (InputPurpose::Bio, &["bio", "about", "description"]),
    (
        InputPurpose::JobApplication,
        &["job", "application", "cover letter"],
    ),
    (InputPurpose::SupportRequest, &["support", "help", "issue"]),
];

static STANDALONE_PURPOSE_RULES: LazyLock<Vec<(InputPurpose, AhoCorasick)>> =
    LazyLock::new(|| compile_rules(STANDALONE_PURPOSE_KEYWORDS));

static FORM_PURPOSE_RULES: LazyLock<Vec<(InputPurpose, AhoCorasick)>> =
    LazyLock::new(|| compile_rules(FORM_PURPOSE_KEYWORDS));

static ARIA_COMPOSER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)message|reply|write|compose").expect("valid pattern"));

fn compile_rules(table: &[(InputPurpose, &[&str])]) -> Vec<(InputPurpose, AhoCorasick)> {
    table
        .iter()
        .map(|(purpose, keywords)| {
            let automaton = AhoCorasick::new(keywords.iter()).expect("valid keyword set");
            (*purpose, automaton)
        })
        .collect()
}

fn match_rules(rules: &[(InputPurpose, AhoCorasick)], haystack: &str) -> Option<InputPurpose> {
    rules
        .iter()
        .find(|(_, automaton)| automaton.is_match(haystack))
        .map(|(purpose, _)| *purpose)
}

/// Re-enumerate every form and editable standalone surface on the page.
#[must_use]
pub fn detect_inputs(snapshot: &PageSnapshot) -> Vec<DetectedInput> {
    let mut walker = Walker {
        snapshot,
        next_index: 0,
        inputs: Vec::new(),
    };
    walker.visit(snapshot.document().root_element());

    let relevant = walker.inputs.iter().filter(|input| input.is_relevant).count();
    tracing::debug!(
        candidates = walker.inputs.len(),
        relevant,
        "Input detection pass"
    );
    walker.inputs
}

struct Walker<'a> {
    snapshot: &'a PageSnapshot,
    next_index: usize,
    inputs: Vec<DetectedInput>,
}

struct FormField<'a> {
    id: InputId,
    element: ElementRef<'a>,
}

impl<'a> Walker<'a> {
    fn assign(&mut self) -> InputId {
        let id = InputId(self.next_index);
        self.next_index += 1;
        id
    }

    fn visit(&mut self, element: ElementRef<'a>) {
        let id = self.assign();

        if element.value().name() == "form" {
            let mut fields = Vec::new();
            for child in element.children() {
                if let Some(el) = ElementRef::wrap(child) {
                    self.visit_form_descendant(el, &mut fields);
                }
            }
            self.inputs.push(analyze_form(self.snapshot, element, id, &fields));
            return;
        }

        if is_field_element(element) {
            self.inputs
                .push(analyze_standalone(self.snapshot, element, id));
        }

        for child in element.children() {
            if let Some(el) = ElementRef::wrap(child) {
                self.visit(el);
            }
        }
    }

    fn visit_form_descendant(&mut self, element: ElementRef<'a>, fields: &mut Vec<FormField<'a>>) {
        let id = self.assign();
        if is_field_element(element) {
            fields.push(FormField { id, element });
        }
        for child in element.children() {
            if let Some(el) = ElementRef::wrap(child) {
                self.visit_form_descendant(el, fields);
            }
        }
    }
}

/// Whether the element counts as a user-editable field at all.
///
/// Shared with the mutation debouncer: an inserted node only triggers a
/// rescan when something in its subtree passes this check.
#[must_use]
pub fn is_field_element(element: ElementRef<'_>) -> bool {
    let value = element.value();
    match value.name() {
        "textarea" | "select" => return true,
        "input" => {
            return !matches!(
                value.attr("type").unwrap_or("text"),
                "hidden" | "submit" | "button"
            );
        }
        _ => {}
    }

    if is_content_editable(element) {
        return true;
    }
    if value.attr("data-placeholder").is_some() {
        return true;
    }
    if has_editor_class(element) {
        return true;
    }
    if value
        .attr("id")
        .is_some_and(|id| id.contains("prompt-textarea"))
    {
        return true;
    }
    value
        .attr("aria-label")
        .is_some_and(|label| ARIA_COMPOSER_PATTERN.is_match(label))
}

/// Content-editable in the broad sense used by modern web editors.
fn is_content_editable(element: ElementRef<'_>) -> bool {
    let value = element.value();
    if matches!(value.attr("contenteditable"), Some("" | "true")) {
        return true;
    }
    if matches!(value.attr("role"), Some("textbox" | "combobox")) {
        return true;
    }
    if value.attr("data-placeholder").is_some() {
        return true;
    }
    has_editor_class(element)
}

fn has_editor_class(element: ElementRef<'_>) -> bool {
    element.value().attr("class").is_some_and(|class| {
        let class = class.to_lowercase();
        EDITOR_CLASS_MARKERS
            .iter()
            .any(|marker| class.contains(marker))
    })
}

/// Lowercased descriptive facets of an element, the raw material for
/// relevance and purpose decisions.
struct Facets {
    tag: String,
    input_type: String,
    placeholder: String,
    name: String,
    id_attr: String,
    aria_label: String,
    data_testid: String,
    class: String,
    label: String,
    ancestor_classes: String,
    in_composer_container: bool,
    size: u32,
}

impl Facets {
    fn haystack(&self) -> String {
        [
            self.placeholder.as_str(),
            self.name.as_str(),
            self.id_attr.as_str(),
            self.label.as_str(),
            self.aria_label.as_str(),
            self.data_testid.as_str(),
            self.class.as_str(),
            self.ancestor_classes.as_str(),
        ]
        .join(" ")
    }
}

fn facets(snapshot: &PageSnapshot, element: ElementRef<'_>) -> Facets {
    let value = element.value();
    let attr = |name: &str| value.attr(name).unwrap_or_default().to_lowercase();

    let tag = value.name().to_lowercase();
    let input_type = if tag == "input" {
        value.attr("type").unwrap_or("text").to_lowercase()
    } else {
        tag.clone()
    };

    let placeholder = [attr("placeholder"), attr("data-placeholder")]
        .join(" ")
        .trim()
        .to_string();

    let (ancestor_classes, in_composer_container) = ancestor_context(element);

    Facets {
        input_type,
        placeholder,
        name: attr("name"),
        id_attr: attr("id"),
        aria_label: attr("aria-label"),
        data_testid: attr("data-testid"),
        class: attr("class"),
        label: label_text(snapshot, value.attr("id")).to_lowercase(),
        ancestor_classes,
        in_composer_container,
        size: value
            .attr("size")
            .and_then(|size| size.parse().ok())
            .unwrap_or(20),
        tag,
    }
}

/// Text of a `<label for=...>` bound to the element, if any.
fn label_text(snapshot: &PageSnapshot, element_id: Option<&str>) -> String {
    let Some(element_id) = element_id.filter(|id| !id.is_empty()) else {
        return String::new();
    };
    let Ok(selector) = Selector::parse("label[for]") else {
        return String::new();
    };
    snapshot
        .document()
        .select(&selector)
        .find(|label| label.value().attr("for") == Some(element_id))
        .map(crate::element_text)
        .unwrap_or_default()
}

/// Display label for prompt headers: bound label, then placeholder, then
/// aria-label, then the field name.
fn display_label(snapshot: &PageSnapshot, element: ElementRef<'_>) -> String {
    let value = element.value();
    let bound = label_text(snapshot, value.attr("id"));
    if !bound.is_empty() {
        return bound;
    }
    for attr in ["placeholder", "data-placeholder", "aria-label", "name"] {
        if let Some(text) = value.attr(attr).filter(|text| !text.trim().is_empty()) {
            return text.trim().to_string();
        }
    }
    String::new()
}

/// Classes of message/compose ancestor containers, plus whether the element
/// sits inside a unified-composer surface.
fn ancestor_context(element: ElementRef<'_>) -> (String, bool) {
    let mut classes = String::new();
    let mut in_composer = false;
    for ancestor in element.ancestors() {
        let Some(el) = ElementRef::wrap(ancestor) else {
            continue;
        };
        if el.value().attr("data-type") == Some("unified-composer") {
            in_composer = true;
        }
        if let Some(class) = el.value().attr("class") {
            let lower = class.to_lowercase();
            if lower.contains("message") || lower.contains("msg-") || lower.contains("compose") {
                classes.push_str(&lower);
                classes.push(' ');
            }
        }
    }
    (classes.trim_end().to_string(), in_composer)
}

fn analyze_standalone(
    snapshot: &PageSnapshot,
    element: ElementRef<'_>,
    id: InputId,
) -> DetectedInput {
    let facets = facets(snapshot, element);
    let editable = facets.tag == "textarea" || is_content_editable(element);
    let purpose = match_rules(&STANDALONE_PURPOSE_RULES, &facets.haystack())
        .unwrap_or(InputPurpose::GeneralText);

    DetectedInput {
        id,
        kind: InputKind::Standalone,
        purpose,
        label: display_label(snapshot, element),
        fields: vec![id],
        has_long_text: editable,
        is_relevant: standalone_relevant(&facets, element),
    }
}

fn standalone_relevant(facets: &Facets, element: ElementRef<'_>) -> bool {
    if facets.tag == "textarea" || is_content_editable(element) {
        return true;
    }
    if facets.input_type == "search" {
        return true;
    }
    // Messaging composers are relevant regardless of their native type.
    if facets.class.contains("msg-form__contenteditable")
        || facets.class.contains("prosemirror")
        || facets.id_attr.contains("prompt-textarea")
        || facets.aria_label.contains("message")
        || facets.in_composer_container
    {
        return true;
    }
    if matches!(facets.input_type.as_str(), "text" | "email") {
        let keyworded = RELEVANT_TEXT_KEYWORDS
            .iter()
            .any(|kw| facets.placeholder.contains(kw) || facets.name.contains(kw));
        return facets.size > 30 || keyworded;
    }
    false
}

fn analyze_form(
    snapshot: &PageSnapshot,
    form: ElementRef<'_>,
    id: InputId,
    fields: &[FormField<'_>],
) -> DetectedInput {
    let field_facets: Vec<Facets> = fields
        .iter()
        .map(|field| facets(snapshot, field.element))
        .collect();

    let mut form_label = String::new();
    let mut haystack = String::new();
    if let Ok(selector) = Selector::parse("label") {
        for label in form.select(&selector) {
            let text = crate::element_text(label);
            if form_label.is_empty() {
                form_label = text.clone();
            }
            haystack.push_str(&text.to_lowercase());
            haystack.push(' ');
        }
    }
    for facet in &field_facets {
        haystack.push_str(&facet.placeholder);
        haystack.push(' ');
    }

    let purpose =
        match_rules(&FORM_PURPOSE_RULES, &haystack).unwrap_or(InputPurpose::GeneralText);
    let has_long_text = fields
        .iter()
        .zip(&field_facets)
        .any(|(field, facet)| facet.tag == "textarea" || is_content_editable(field.element));

    DetectedInput {
        id,
        kind: InputKind::Form,
        purpose,
        label: form_label,
        fields: fields.iter().map(|field| field.id).collect(),
        has_long_text,
        is_relevant: form_relevant(&field_facets, has_long_text),
    }
}

fn form_relevant(field_facets: &[Facets], has_long_text: bool) -> bool {
    if field_facets.is_empty() {
        return false;
    }
    if has_long_text {
        return true;
    }
    if field_facets.len() == 1 {
        let only = &field_facets[0];
        return only.input_type == "search"
            || only.placeholder.contains("search")
            || only.placeholder.contains("message");
    }
    field_facets.len() >= 2
}
