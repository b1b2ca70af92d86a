//! Website sections, section templates and document operations.
//!
//! A website document is an ordered `Vec<Section>`. All operations are pure:
//! they take the current document and return a new one, so the editor can
//! commit each result as an immutable history snapshot.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::error::CoreError;

/// Maximum number of sections on a single page.
pub const MAX_SECTIONS_PER_PAGE: usize = 50;

/// Maximum serialized size of one section's content mapping.
pub const MAX_SECTION_CONTENT_BYTES: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// Section kinds
// ---------------------------------------------------------------------------

/// The block types offered by the website builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Hero,
    Text,
    Image,
    ProductGrid,
    Gallery,
    Testimonials,
    Faq,
    Contact,
    Video,
    Cta,
}

impl SectionKind {
    pub const ALL: [SectionKind; 10] = [
        Self::Hero,
        Self::Text,
        Self::Image,
        Self::ProductGrid,
        Self::Gallery,
        Self::Testimonials,
        Self::Faq,
        Self::Contact,
        Self::Video,
        Self::Cta,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hero => "hero",
            Self::Text => "text",
            Self::Image => "image",
            Self::ProductGrid => "product_grid",
            Self::Gallery => "gallery",
            Self::Testimonials => "testimonials",
            Self::Faq => "faq",
            Self::Contact => "contact",
            Self::Video => "video",
            Self::Cta => "cta",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| CoreError::Validation(format!("Unbekannter Abschnittstyp '{name}'")))
    }

    /// German label shown in the builder's block picker.
    pub fn label(self) -> &'static str {
        match self {
            Self::Hero => "Titelbereich",
            Self::Text => "Textblock",
            Self::Image => "Bild",
            Self::ProductGrid => "Produktraster",
            Self::Gallery => "Galerie",
            Self::Testimonials => "Kundenstimmen",
            Self::Faq => "Häufige Fragen",
            Self::Contact => "Kontakt",
            Self::Video => "Video",
            Self::Cta => "Handlungsaufforderung",
        }
    }

    /// Default content for a freshly inserted block of this kind.
    pub fn default_content(self) -> Map<String, Value> {
        let value = match self {
            Self::Hero => json!({
                "title": "Willkommen in unserem Shop",
                "subtitle": "Entdecke unsere neuesten Produkte",
                "button_text": "Jetzt einkaufen",
                "button_link": "/produkte",
                "background_image": null,
            }),
            Self::Text => json!({
                "heading": "Über uns",
                "body": "Erzähle deinen Kunden etwas über dein Unternehmen.",
                "alignment": "left",
            }),
            Self::Image => json!({
                "media_id": null,
                "alt_text": "",
                "caption": "",
            }),
            Self::ProductGrid => json!({
                "heading": "Unsere Produkte",
                "product_ids": [],
                "columns": 3,
            }),
            Self::Gallery => json!({
                "heading": "Galerie",
                "media_ids": [],
            }),
            Self::Testimonials => json!({
                "heading": "Das sagen unsere Kunden",
                "items": [
                    { "author": "Max Mustermann", "quote": "Schnelle Lieferung, super Support!" }
                ],
            }),
            Self::Faq => json!({
                "heading": "Häufige Fragen",
                "items": [
                    { "question": "Wie lange dauert der Versand?", "answer": "Digitale Produkte erhältst du sofort nach Zahlungseingang." }
                ],
            }),
            Self::Contact => json!({
                "heading": "Kontakt",
                "email": "",
                "discord_url": "",
            }),
            Self::Video => json!({
                "url": "",
                "autoplay": false,
            }),
            Self::Cta => json!({
                "text": "Bereit loszulegen?",
                "button_text": "Jetzt kaufen",
                "button_link": "/checkout",
            }),
        };
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Sections and templates
// ---------------------------------------------------------------------------

/// One typed content block of a website document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: Uuid,
    pub kind: SectionKind,
    #[serde(default)]
    pub content: Map<String, Value>,
}

impl Section {
    /// Build a new section of `kind` with its template content and a fresh id.
    pub fn from_template(kind: SectionKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            content: kind.default_content(),
        }
    }
}

/// Template description returned by the templates endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct SectionTemplate {
    pub kind: SectionKind,
    pub label: &'static str,
    pub content: Map<String, Value>,
}

/// All section templates in picker order.
pub fn templates() -> Vec<SectionTemplate> {
    SectionKind::ALL
        .into_iter()
        .map(|kind| SectionTemplate {
            kind,
            label: kind.label(),
            content: kind.default_content(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a whole document (used when a client replaces all sections).
pub fn validate_document(doc: &[Section]) -> Result<(), CoreError> {
    if doc.len() > MAX_SECTIONS_PER_PAGE {
        return Err(CoreError::Validation(format!(
            "Eine Seite darf höchstens {MAX_SECTIONS_PER_PAGE} Abschnitte enthalten"
        )));
    }
    let mut seen = std::collections::HashSet::with_capacity(doc.len());
    for section in doc {
        if !seen.insert(section.id) {
            return Err(CoreError::Validation(format!(
                "Abschnitt {} ist doppelt vorhanden",
                section.id
            )));
        }
        validate_content_size(&section.content)?;
    }
    Ok(())
}

fn validate_content_size(content: &Map<String, Value>) -> Result<(), CoreError> {
    let size = serde_json::to_vec(content)
        .map_err(|e| CoreError::Internal(format!("Failed to serialize section content: {e}")))?
        .len();
    if size > MAX_SECTION_CONTENT_BYTES {
        return Err(CoreError::Validation(format!(
            "Abschnittsinhalt ist zu groß ({size} Bytes, maximal {MAX_SECTION_CONTENT_BYTES})"
        )));
    }
    Ok(())
}

fn find_index(doc: &[Section], id: Uuid) -> Result<usize, CoreError> {
    doc.iter()
        .position(|s| s.id == id)
        .ok_or_else(|| CoreError::Validation(format!("Abschnitt {id} wurde nicht gefunden")))
}

// ---------------------------------------------------------------------------
// Document operations
// ---------------------------------------------------------------------------

/// Insert `section` at `index` (clamped to the end), or append when `None`.
pub fn insert_section(
    doc: &[Section],
    section: Section,
    index: Option<usize>,
) -> Result<Vec<Section>, CoreError> {
    if doc.len() >= MAX_SECTIONS_PER_PAGE {
        return Err(CoreError::Validation(format!(
            "Eine Seite darf höchstens {MAX_SECTIONS_PER_PAGE} Abschnitte enthalten"
        )));
    }
    validate_content_size(&section.content)?;

    let mut next = doc.to_vec();
    let at = index.unwrap_or(next.len()).min(next.len());
    next.insert(at, section);
    Ok(next)
}

pub fn remove_section(doc: &[Section], id: Uuid) -> Result<Vec<Section>, CoreError> {
    let idx = find_index(doc, id)?;
    let mut next = doc.to_vec();
    next.remove(idx);
    Ok(next)
}

/// Move the section `id` so that it ends up at `to_index` (clamped).
pub fn move_section(doc: &[Section], id: Uuid, to_index: usize) -> Result<Vec<Section>, CoreError> {
    let from = find_index(doc, id)?;
    let mut next = doc.to_vec();
    let section = next.remove(from);
    let to = to_index.min(next.len());
    next.insert(to, section);
    Ok(next)
}

/// Shallow-merge `patch` into the section's content. `null` deletes a key.
pub fn update_section_content(
    doc: &[Section],
    id: Uuid,
    patch: &Value,
) -> Result<Vec<Section>, CoreError> {
    let patch = patch.as_object().ok_or_else(|| {
        CoreError::Validation("Abschnittsinhalt muss ein JSON-Objekt sein".to_string())
    })?;
    let idx = find_index(doc, id)?;
    let mut next = doc.to_vec();

    let content = &mut next[idx].content;
    for (key, value) in patch {
        if value.is_null() {
            content.remove(key);
        } else {
            content.insert(key.clone(), value.clone());
        }
    }
    validate_content_size(content)?;
    Ok(next)
}

/// Copy the section `id` with a fresh id and insert it right after the source.
pub fn duplicate_section(doc: &[Section], id: Uuid) -> Result<Vec<Section>, CoreError> {
    let idx = find_index(doc, id)?;
    let copy = Section {
        id: Uuid::new_v4(),
        ..doc[idx].clone()
    };
    insert_section(doc, copy, Some(idx + 1))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn doc_of(kinds: &[SectionKind]) -> Vec<Section> {
        kinds.iter().map(|k| Section::from_template(*k)).collect()
    }

    fn kinds(doc: &[Section]) -> Vec<SectionKind> {
        doc.iter().map(|s| s.kind).collect()
    }

    #[test]
    fn kind_names_round_trip() {
        for kind in SectionKind::ALL {
            assert_eq!(SectionKind::from_name(kind.as_str()).unwrap(), kind);
        }
        assert!(SectionKind::from_name("carousel").is_err());
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_value(SectionKind::ProductGrid).unwrap();
        assert_eq!(json, "product_grid");
    }

    #[test]
    fn templates_cover_every_kind_with_object_content() {
        let all = templates();
        assert_eq!(all.len(), SectionKind::ALL.len());
        assert!(all.iter().all(|t| !t.content.is_empty()));
        assert_eq!(all[0].content["title"], "Willkommen in unserem Shop");
    }

    #[test]
    fn from_template_generates_fresh_ids() {
        let a = Section::from_template(SectionKind::Text);
        let b = Section::from_template(SectionKind::Text);
        assert_ne!(a.id, b.id);
        assert_eq!(a.content, b.content);
    }

    #[test]
    fn insert_appends_by_default_and_clamps_index() {
        let doc = doc_of(&[SectionKind::Hero]);
        let doc = insert_section(&doc, Section::from_template(SectionKind::Text), None).unwrap();
        let doc =
            insert_section(&doc, Section::from_template(SectionKind::Faq), Some(999)).unwrap();
        let doc = insert_section(&doc, Section::from_template(SectionKind::Cta), Some(0)).unwrap();
        assert_eq!(
            kinds(&doc),
            vec![
                SectionKind::Cta,
                SectionKind::Hero,
                SectionKind::Text,
                SectionKind::Faq
            ]
        );
    }

    #[test]
    fn insert_rejects_full_page() {
        let doc = doc_of(&[SectionKind::Text; MAX_SECTIONS_PER_PAGE]);
        let result = insert_section(&doc, Section::from_template(SectionKind::Text), None);
        assert_matches!(result, Err(CoreError::Validation(_)));
    }

    #[test]
    fn remove_and_missing_id() {
        let doc = doc_of(&[SectionKind::Hero, SectionKind::Text]);
        let next = remove_section(&doc, doc[0].id).unwrap();
        assert_eq!(kinds(&next), vec![SectionKind::Text]);
        assert_matches!(
            remove_section(&doc, Uuid::new_v4()),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn move_reorders_sections() {
        let doc = doc_of(&[SectionKind::Hero, SectionKind::Text, SectionKind::Cta]);
        let next = move_section(&doc, doc[0].id, 2).unwrap();
        assert_eq!(
            kinds(&next),
            vec![SectionKind::Text, SectionKind::Cta, SectionKind::Hero]
        );
        let back = move_section(&next, doc[0].id, 0).unwrap();
        assert_eq!(kinds(&back), kinds(&doc));
        // Original document is untouched.
        assert_eq!(doc[0].kind, SectionKind::Hero);
    }

    #[test]
    fn update_merges_and_deletes_keys() {
        let doc = doc_of(&[SectionKind::Hero]);
        let id = doc[0].id;
        let next = update_section_content(
            &doc,
            id,
            &json!({ "title": "Sommer-Sale", "background_image": null, "badge": "-20%" }),
        )
        .unwrap();
        let content = &next[0].content;
        assert_eq!(content["title"], "Sommer-Sale");
        assert_eq!(content["badge"], "-20%");
        assert!(!content.contains_key("background_image"));
        assert_eq!(content["button_text"], "Jetzt einkaufen");
    }

    #[test]
    fn update_rejects_non_object_patch() {
        let doc = doc_of(&[SectionKind::Text]);
        assert_matches!(
            update_section_content(&doc, doc[0].id, &json!(["x"])),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn update_rejects_oversized_content() {
        let doc = doc_of(&[SectionKind::Text]);
        let big = "x".repeat(MAX_SECTION_CONTENT_BYTES + 1);
        assert_matches!(
            update_section_content(&doc, doc[0].id, &json!({ "body": big })),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn duplicate_inserts_copy_after_source() {
        let doc = doc_of(&[SectionKind::Hero, SectionKind::Faq]);
        let next = duplicate_section(&doc, doc[0].id).unwrap();
        assert_eq!(
            kinds(&next),
            vec![SectionKind::Hero, SectionKind::Hero, SectionKind::Faq]
        );
        assert_ne!(next[0].id, next[1].id);
        assert_eq!(next[0].content, next[1].content);
    }

    #[test]
    fn validate_document_rejects_duplicate_ids() {
        let mut doc = doc_of(&[SectionKind::Hero, SectionKind::Text]);
        doc[1].id = doc[0].id;
        assert_matches!(validate_document(&doc), Err(CoreError::Validation(_)));
    }

    #[test]
    fn section_deserializes_without_content() {
        let id = Uuid::new_v4();
        let section: Section =
            serde_json::from_value(json!({ "id": id, "kind": "video" })).unwrap();
        assert!(section.content.is_empty());
        assert_eq!(section.kind, SectionKind::Video);
    }
}
