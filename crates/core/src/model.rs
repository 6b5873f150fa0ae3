//! Saved-item records as retrieved from Pocket and as published.
//!
//! [`RawItem`] mirrors the upstream `detailType=complete` payload closely
//! enough to decode it, while [`EnrichedItem`] is the flat record written to
//! the snapshot. The upstream encodes most integers as JSON strings, so the
//! integer fields here accept either representation.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

/// Tri-state flag used by Pocket for `has_image` and `has_video`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Presence {
    /// The item has no media of this kind.
    #[default]
    None,
    /// The item has media of this kind attached.
    Attached,
    /// The item itself is media of this kind.
    IsContent,
}

impl Presence {
    /// Maps the upstream code: `0` is absent, `2` is "is the content",
    /// anything else counts as attached.
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Presence::None,
            2 => Presence::IsContent,
            _ => Presence::Attached,
        }
    }
}

impl<'de> Deserialize<'de> for Presence {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        lenient_i64(deserializer).map(Presence::from_code)
    }
}

/// Published content classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Article,
    Image,
    Video,
}

impl ContentType {
    /// Classifies an item from its media flags. The image check runs first, so
    /// an item flagged as both image and video content is an image.
    pub fn classify(has_image: Presence, has_video: Presence) -> Self {
        if has_image == Presence::IsContent {
            ContentType::Image
        } else if has_video == Presence::IsContent {
            ContentType::Video
        } else {
            ContentType::Article
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Article => "article",
            ContentType::Image => "image",
            ContentType::Video => "video",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An image attached to a saved item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ImageDescriptor {
    /// Source URL of the image.
    #[serde(default)]
    pub src: String,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub width: u32,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub height: u32,
    #[serde(default)]
    pub caption: String,
}

/// One saved entry as returned by the retrieval endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawItem {
    #[serde(deserialize_with = "lenient_u64")]
    pub item_id: u64,
    #[serde(default)]
    pub given_url: String,
    #[serde(default)]
    pub resolved_url: String,
    #[serde(default)]
    pub given_title: String,
    #[serde(default)]
    pub resolved_title: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub has_image: Presence,
    #[serde(default)]
    pub has_video: Presence,
    /// Attached images keyed by their upstream index, kept in index order.
    #[serde(default, deserialize_with = "keyed_images")]
    pub images: Vec<ImageDescriptor>,
    /// Rank assigned by the upstream service.
    #[serde(default, deserialize_with = "lenient_i64")]
    pub sort_id: i64,
}

impl RawItem {
    /// Resolved title when present, otherwise the title as saved.
    pub fn display_title(&self) -> &str {
        if self.resolved_title.is_empty() { &self.given_title } else { &self.resolved_title }
    }

    /// Resolved URL when present, otherwise the URL as saved.
    pub fn canonical_url(&self) -> &str {
        if self.resolved_url.is_empty() { &self.given_url } else { &self.resolved_url }
    }

    pub fn content_type(&self) -> ContentType {
        ContentType::classify(self.has_image, self.has_video)
    }
}

/// Full retrieval response: the item mapping plus batch metadata.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RetrieveResponse {
    #[serde(default, deserialize_with = "item_list")]
    pub list: HashMap<String, RawItem>,
    #[serde(default)]
    pub status: i64,
    #[serde(default)]
    pub complete: i64,
    #[serde(default)]
    pub since: i64,
}

/// Published representation of a saved item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedItem {
    pub item_id: u64,
    pub title: String,
    pub url: String,
    pub excerpt: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub sort_id: i64,
    /// Public image URL, or empty when no image is available.
    pub image: String,
}

struct LenientInt;

impl<'de> Visitor<'de> for LenientInt {
    type Value = i64;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an integer or a string containing an integer")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
        Ok(v)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
        i64::try_from(v).map_err(|_| E::custom(format!("integer {v} out of range")))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<i64, E> {
        let v = v.trim();
        if v.is_empty() {
            return Ok(0);
        }
        v.parse().map_err(|_| E::custom(format!("invalid integer string {v:?}")))
    }

    fn visit_unit<E: de::Error>(self) -> Result<i64, E> {
        Ok(0)
    }
}

fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    deserializer.deserialize_any(LenientInt)
}

fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let v = lenient_i64(deserializer)?;
    u64::try_from(v).map_err(|_| de::Error::custom(format!("negative identifier {v}")))
}

fn lenient_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let v = lenient_i64(deserializer)?;
    u32::try_from(v).map_err(|_| de::Error::custom(format!("dimension {v} out of range")))
}

/// Pocket sends `[]` instead of `{}` for an empty list.
#[derive(Deserialize)]
#[serde(untagged)]
enum ListOrMap<T> {
    Map(HashMap<String, T>),
    List(Vec<T>),
}

fn item_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<HashMap<String, RawItem>, D::Error> {
    match Option::<ListOrMap<RawItem>>::deserialize(deserializer)? {
        Some(ListOrMap::Map(map)) => Ok(map),
        Some(ListOrMap::List(items)) => Ok(items.into_iter().map(|item| (item.item_id.to_string(), item)).collect()),
        None => Ok(HashMap::new()),
    }
}

fn keyed_images<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<ImageDescriptor>, D::Error> {
    match Option::<ListOrMap<ImageDescriptor>>::deserialize(deserializer)? {
        Some(ListOrMap::Map(map)) => {
            // Numeric keys sort numerically; anything else sorts after, by key.
            let ordered: BTreeMap<(u64, String), ImageDescriptor> = map
                .into_iter()
                .map(|(key, image)| ((key.parse().unwrap_or(u64::MAX), key), image))
                .collect();
            Ok(ordered.into_values().collect())
        }
        Some(ListOrMap::List(images)) => Ok(images),
        None => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const SAMPLE: &str = r#"{
        "status": 1,
        "complete": 1,
        "since": 1700000000,
        "list": {
            "229279689": {
                "item_id": "229279689",
                "resolved_id": "229279689",
                "given_url": "http://www.grantland.com/story/_/id/9158/the-worst",
                "given_title": "The Worst",
                "favorite": "0",
                "status": "0",
                "resolved_title": "The Worst Owners in Sports",
                "resolved_url": "http://www.grantland.com/story/_/id/9158/the-worst-owners",
                "excerpt": "A look at the owners.",
                "is_article": "1",
                "has_video": "1",
                "has_image": "1",
                "word_count": "3197",
                "images": {
                    "2": {"item_id": "229279689", "image_id": "2", "src": "http://b.example/2.jpg", "width": "0", "height": "0"},
                    "1": {"item_id": "229279689", "image_id": "1", "src": "http://a.example/1.jpg", "width": "640", "height": "480", "caption": ""}
                },
                "sort_id": 3
            }
        }
    }"#;

    #[test]
    fn test_decode_complete_payload() {
        let response: RetrieveResponse = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(response.status, 1);
        assert_eq!(response.since, 1_700_000_000);

        let item = &response.list["229279689"];
        assert_eq!(item.item_id, 229279689);
        assert_eq!(item.has_image, Presence::Attached);
        assert_eq!(item.has_video, Presence::Attached);
        assert_eq!(item.sort_id, 3);
        assert_eq!(item.images.len(), 2);
        assert_eq!(item.images[0].src, "http://a.example/1.jpg");
        assert_eq!(item.images[0].width, 640);
        assert_eq!(item.images[1].src, "http://b.example/2.jpg");
    }

    #[test]
    fn test_empty_list_is_array() {
        let response: RetrieveResponse = serde_json::from_str(r#"{"status": 2, "complete": 1, "list": []}"#).unwrap();
        assert!(response.list.is_empty());
    }

    #[test]
    fn test_missing_optional_fields() {
        let item: RawItem = serde_json::from_str(r#"{"item_id": 7}"#).unwrap();
        assert_eq!(item.item_id, 7);
        assert_eq!(item.has_image, Presence::None);
        assert!(item.images.is_empty());
        assert_eq!(item.canonical_url(), "");
    }

    #[test]
    fn test_invalid_item_id_rejected() {
        assert!(serde_json::from_str::<RawItem>(r#"{"item_id": "abc"}"#).is_err());
        assert!(serde_json::from_str::<RawItem>(r#"{"item_id": "-4"}"#).is_err());
    }

    #[rstest]
    #[case(0, Presence::None)]
    #[case(1, Presence::Attached)]
    #[case(2, Presence::IsContent)]
    #[case(9, Presence::Attached)]
    fn test_presence_codes(#[case] code: i64, #[case] expected: Presence) {
        assert_eq!(Presence::from_code(code), expected);
    }

    #[rstest]
    #[case(Presence::IsContent, Presence::None, ContentType::Image)]
    #[case(Presence::None, Presence::IsContent, ContentType::Video)]
    #[case(Presence::Attached, Presence::Attached, ContentType::Article)]
    #[case(Presence::IsContent, Presence::IsContent, ContentType::Image)]
    fn test_classify(#[case] image: Presence, #[case] video: Presence, #[case] expected: ContentType) {
        assert_eq!(ContentType::classify(image, video), expected);
    }

    #[test]
    fn test_title_and_url_fallback() {
        let item = RawItem {
            given_title: "given".into(),
            given_url: "http://given".into(),
            ..Default::default()
        };
        assert_eq!(item.display_title(), "given");
        assert_eq!(item.canonical_url(), "http://given");

        let item = RawItem { resolved_title: "resolved".into(), resolved_url: "http://resolved".into(), ..item };
        assert_eq!(item.display_title(), "resolved");
        assert_eq!(item.canonical_url(), "http://resolved");
    }

    #[test]
    fn test_enriched_item_field_names() {
        let item = EnrichedItem {
            item_id: 1,
            title: "t".into(),
            url: "u".into(),
            excerpt: "e".into(),
            content_type: ContentType::Video,
            sort_id: 4,
            image: String::new(),
        };
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["type"], "video");
        assert_eq!(value["item_id"], 1);
        assert_eq!(value["sort_id"], 4);
        assert_eq!(value["image"], "");
    }

    #[test]
    fn test_content_type_display_matches_wire_name() {
        for ty in [ContentType::Article, ContentType::Image, ContentType::Video] {
            assert_eq!(serde_json::to_value(ty).unwrap(), ty.to_string());
        }
    }
}
