//! Lesson records and keyed lookups over an in-memory catalog

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single lesson
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Markdown body; the input to summaries and question generation
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub category_id: String,
}

impl Lesson {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        category_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            content: content.into(),
            tags: Vec::new(),
            category_id: category_id.into(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Cache tag shared by everything derived from this lesson
    pub fn cache_tag(&self) -> String {
        lesson_tag(&self.id)
    }
}

/// Cache tag for derived content of the lesson with `id`
pub fn lesson_tag(id: &str) -> String {
    format!("lesson:{}", id)
}

/// Lessons in catalog order with an id index
#[derive(Debug, Clone, Default)]
pub struct LessonCatalog {
    lessons: Vec<Lesson>,
    by_id: HashMap<String, usize>,
}

impl LessonCatalog {
    /// Build a catalog; a later lesson with a duplicate id replaces the earlier one
    pub fn from_lessons(lessons: impl IntoIterator<Item = Lesson>) -> Self {
        let mut catalog = Self::default();
        for lesson in lessons {
            match catalog.by_id.get(&lesson.id) {
                Some(&index) => catalog.lessons[index] = lesson,
                None => {
                    catalog.by_id.insert(lesson.id.clone(), catalog.lessons.len());
                    catalog.lessons.push(lesson);
                }
            }
        }
        catalog
    }

    /// Parse a JSON array of lessons
    pub fn from_json(json: &str) -> Result<Self> {
        let lessons: Vec<Lesson> = serde_json::from_str(json)?;
        Ok(Self::from_lessons(lessons))
    }

    pub fn get_lesson_by_id(&self, id: &str) -> Option<&Lesson> {
        self.by_id.get(id).map(|&index| &self.lessons[index])
    }

    /// Lessons in `category_id`, in catalog order
    pub fn get_lessons_by_category(&self, category_id: &str) -> Vec<&Lesson> {
        self.lessons
            .iter()
            .filter(|lesson| lesson.category_id == category_id)
            .collect()
    }

    /// Distinct category ids in first-seen order
    pub fn categories(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for lesson in &self.lessons {
            if !seen.contains(&lesson.category_id.as_str()) {
                seen.push(lesson.category_id.as_str());
            }
        }
        seen
    }

    pub fn len(&self) -> usize {
        self.lessons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IntelError;

    fn catalog() -> LessonCatalog {
        LessonCatalog::from_lessons(vec![
            Lesson::new("water-1", "Water", "science", "Water is wet."),
            Lesson::new("poems-1", "Haiku", "writing", "Five seven five."),
            Lesson::new("water-2", "Oceans", "science", "Oceans are deep."),
        ])
    }

    #[test]
    fn test_lookup_by_id() {
        let catalog = catalog();
        assert_eq!(catalog.get_lesson_by_id("poems-1").unwrap().title, "Haiku");
        assert!(catalog.get_lesson_by_id("missing").is_none());
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn test_lookup_by_category_keeps_order() {
        let catalog = catalog();
        let ids: Vec<_> = catalog
            .get_lessons_by_category("science")
            .iter()
            .map(|lesson| lesson.id.as_str())
            .collect();
        assert_eq!(ids, vec!["water-1", "water-2"]);
        assert!(catalog.get_lessons_by_category("art").is_empty());
        assert_eq!(catalog.categories(), vec!["science", "writing"]);
    }

    #[test]
    fn test_duplicate_id_replaces() {
        let catalog = LessonCatalog::from_lessons(vec![
            Lesson::new("a", "First", "c", "one"),
            Lesson::new("a", "Second", "c", "two"),
        ]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get_lesson_by_id("a").unwrap().title, "Second");
    }

    #[test]
    fn test_from_json() {
        let json = r#"[
            {"id": "l1", "title": "Rain", "content": "Rain falls.", "categoryId": "weather", "tags": ["water"]}
        ]"#;
        let catalog = LessonCatalog::from_json(json).unwrap();
        let lesson = catalog.get_lesson_by_id("l1").unwrap();
        assert_eq!(lesson.tags, vec!["water"]);
        assert_eq!(lesson.description, "");
        assert_eq!(lesson.cache_tag(), "lesson:l1");

        assert!(matches!(
            LessonCatalog::from_json("not json"),
            Err(IntelError::SerializationError(_))
        ));
    }
}
