//! JSON-LD documents for guide pages.
//!
//! Every guide gets an Article, a Course and a BreadcrumbList. A HowTo is
//! added for guides flagged as procedures (one step per section, in section
//! order), and a FAQPage for guides with FAQ items. Optional documents are
//! omitted when their inputs are missing; nothing is emitted half-filled.

use super::{breadcrumb_trail, canonical_url, resolve_description};
use crate::config::SiteConfig;
use crate::types::Guide;
use serde::Serialize;

pub const SCHEMA_ORG: &str = "https://schema.org";

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "@type")]
pub enum StructuredData {
    Article(Article),
    Course(Course),
    BreadcrumbList(BreadcrumbList),
    HowTo(HowTo),
    #[serde(rename = "FAQPage")]
    FaqPage(FaqPage),
}

impl StructuredData {
    pub fn type_name(&self) -> &'static str {
        match self {
            StructuredData::Article(_) => "Article",
            StructuredData::Course(_) => "Course",
            StructuredData::BreadcrumbList(_) => "BreadcrumbList",
            StructuredData::HowTo(_) => "HowTo",
            StructuredData::FaqPage(_) => "FAQPage",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(rename = "@context")]
    pub context: &'static str,
    pub headline: String,
    pub description: String,
    pub url: String,
    pub main_entity_of_page: WebPageRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub author: Organization,
    pub publisher: Organization,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_published: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_modified: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    pub article_section: &'static str,
    pub in_language: String,
    pub word_count: usize,
    pub time_required: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    #[serde(rename = "@context")]
    pub context: &'static str,
    pub name: String,
    pub description: String,
    pub url: String,
    pub provider: Organization,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub educational_level: Option<String>,
    pub in_language: String,
    pub time_required: String,
    pub has_course_instance: CourseInstance,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreadcrumbList {
    #[serde(rename = "@context")]
    pub context: &'static str,
    pub item_list_element: Vec<ListItem>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HowTo {
    #[serde(rename = "@context")]
    pub context: &'static str,
    pub name: String,
    pub description: String,
    pub url: String,
    pub total_time: String,
    pub step: Vec<HowToStep>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FaqPage {
    #[serde(rename = "@context")]
    pub context: &'static str,
    pub main_entity: Vec<Question>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WebPageRef {
    #[serde(rename = "@type")]
    pub kind: &'static str,
    #[serde(rename = "@id")]
    pub id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Organization {
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub name: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<ImageObject>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageObject {
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseInstance {
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub course_mode: &'static str,
    pub course_workload: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListItem {
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub position: usize,
    pub name: String,
    pub item: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HowToStep {
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub position: usize,
    pub name: String,
    pub text: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub name: String,
    pub accepted_answer: Answer,
}

#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub text: String,
}

/// ISO 8601 duration, e.g. `PT12M`.
fn duration(minutes: usize) -> String {
    format!("PT{minutes}M")
}

fn publisher(config: &SiteConfig) -> Organization {
    Organization {
        kind: "Organization",
        name: config.site.name.clone(),
        url: config.absolute_url("/"),
        logo: config.site.logo.as_ref().map(|logo| ImageObject {
            kind: "ImageObject",
            url: config.absolute_url(logo),
        }),
    }
}

/// Build the JSON-LD documents for a guide, in emission order.
pub fn guide_structured_data(guide: &Guide, config: &SiteConfig) -> Vec<StructuredData> {
    let title = if guide.title.trim().is_empty() {
        config.site.name.clone()
    } else {
        guide.title.clone()
    };
    let url = canonical_url(guide, config);
    let description = resolve_description(guide, config);
    let time_required = duration(guide.reading_minutes());
    let image = guide
        .image
        .as_ref()
        .map(|i| i.src.as_str())
        .or(config.site.default_image.as_deref())
        .map(|src| config.absolute_url(src));
    let keywords = (!guide.keywords.is_empty()).then(|| guide.keywords.join(", "));

    let mut docs = vec![
        StructuredData::Article(Article {
            context: SCHEMA_ORG,
            headline: title.clone(),
            description: description.clone(),
            url: url.clone(),
            main_entity_of_page: WebPageRef {
                kind: "WebPage",
                id: url.clone(),
            },
            image,
            author: publisher(config),
            publisher: publisher(config),
            date_published: guide.published.clone(),
            date_modified: guide.modified.clone().or_else(|| guide.published.clone()),
            keywords,
            article_section: guide.category.label(),
            in_language: config.site.language.clone(),
            word_count: guide.word_count,
            time_required: time_required.clone(),
        }),
        StructuredData::Course(Course {
            context: SCHEMA_ORG,
            name: title.clone(),
            description: description.clone(),
            url: url.clone(),
            provider: publisher(config),
            educational_level: guide.level.clone(),
            in_language: config.site.language.clone(),
            time_required: time_required.clone(),
            has_course_instance: CourseInstance {
                kind: "CourseInstance",
                course_mode: "Online",
                course_workload: time_required.clone(),
            },
        }),
    ];

    let mut trail = breadcrumb_trail(guide);
    if let Some(last) = trail.last_mut() {
        last.name = title.clone();
    }
    docs.push(StructuredData::BreadcrumbList(BreadcrumbList {
        context: SCHEMA_ORG,
        item_list_element: trail
            .iter()
            .enumerate()
            .map(|(i, crumb)| ListItem {
                kind: "ListItem",
                position: i + 1,
                name: crumb.name.clone(),
                item: config.absolute_url(&crumb.path),
            })
            .collect(),
    }));

    if guide.procedure && !guide.sections.is_empty() {
        docs.push(StructuredData::HowTo(HowTo {
            context: SCHEMA_ORG,
            name: title.clone(),
            description: description.clone(),
            url: url.clone(),
            total_time: time_required,
            step: guide
                .sections
                .iter()
                .enumerate()
                .map(|(i, section)| HowToStep {
                    kind: "HowToStep",
                    position: i + 1,
                    name: section.label.clone(),
                    text: section
                        .summary
                        .clone()
                        .unwrap_or_else(|| section.label.clone()),
                    url: format!("{url}#{}", section.id),
                })
                .collect(),
        }));
    }

    let questions: Vec<Question> = guide
        .faq
        .iter()
        .filter(|item| !item.question.trim().is_empty() && !item.answer.trim().is_empty())
        .map(|item| Question {
            kind: "Question",
            name: item.question.trim().to_string(),
            accepted_answer: Answer {
                kind: "Answer",
                text: item.answer.trim().to_string(),
            },
        })
        .collect();
    if !questions.is_empty() {
        docs.push(StructuredData::FaqPage(FaqPage {
            context: SCHEMA_ORG,
            main_entity: questions,
        }));
    }

    docs
}

/// Serialize a document for an inline `<script type="application/ld+json">`.
///
/// `</` is escaped so content cannot close the script element.
pub fn to_json_ld(doc: &StructuredData) -> Result<String, serde_json::Error> {
    Ok(serde_json::to_string(doc)?.replace("</", "<\\/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seo::guide_metadata;
    use crate::test_helpers::guide;
    use crate::types::{Category, FaqItem, Section};
    use serde_json::Value;

    fn section(id: &str, label: &str, summary: Option<&str>) -> Section {
        Section {
            id: id.to_string(),
            label: label.to_string(),
            summary: summary.map(str::to_string),
        }
    }

    fn grinding() -> Guide {
        let mut g = guide("grinding", Category::Process, 30);
        g.title = "Grinding Guide".to_string();
        g.procedure = true;
        g.sections = vec![
            section("planar-grinding", "Planar Grinding", Some("Flatten the specimen.")),
            section("fine-grinding", "Fine Grinding", None),
            section("cleaning", "Cleaning Between Steps", Some("Rinse and dry.")),
        ];
        g
    }

    fn json(doc: &StructuredData) -> Value {
        serde_json::from_str(&to_json_ld(doc).unwrap()).unwrap()
    }

    fn types(docs: &[StructuredData]) -> Vec<&'static str> {
        docs.iter().map(StructuredData::type_name).collect()
    }

    #[test]
    fn standard_guide_has_three_documents() {
        let mut g = grinding();
        g.procedure = false;
        let docs = guide_structured_data(&g, &SiteConfig::default());
        assert_eq!(types(&docs), ["Article", "Course", "BreadcrumbList"]);
    }

    #[test]
    fn procedure_adds_howto_in_section_order() {
        let docs = guide_structured_data(&grinding(), &SiteConfig::default());
        assert_eq!(types(&docs), ["Article", "Course", "BreadcrumbList", "HowTo"]);
        let howto = json(&docs[3]);
        let names: Vec<&str> = howto["step"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["Planar Grinding", "Fine Grinding", "Cleaning Between Steps"]);
        assert_eq!(howto["step"][0]["position"], 1);
        assert_eq!(
            howto["step"][1]["url"],
            "https://guides.example.com/guides/grinding#fine-grinding"
        );
        // Missing summary falls back to the label
        assert_eq!(howto["step"][1]["text"], "Fine Grinding");
    }

    #[test]
    fn procedure_without_sections_omits_howto() {
        let mut g = grinding();
        g.sections.clear();
        let docs = guide_structured_data(&g, &SiteConfig::default());
        assert!(!types(&docs).contains(&"HowTo"));
    }

    #[test]
    fn faq_page_skips_blank_items() {
        let mut g = grinding();
        g.procedure = false;
        g.faq = vec![
            FaqItem {
                question: "Which grit first?".to_string(),
                answer: "The finest that removes sectioning damage quickly.".to_string(),
            },
            FaqItem {
                question: " ".to_string(),
                answer: "orphan".to_string(),
            },
        ];
        let docs = guide_structured_data(&g, &SiteConfig::default());
        assert_eq!(types(&docs).last(), Some(&"FAQPage"));
        let faq = json(docs.last().unwrap());
        assert_eq!(faq["mainEntity"].as_array().unwrap().len(), 1);
        assert_eq!(faq["mainEntity"][0]["acceptedAnswer"]["@type"], "Answer");
    }

    #[test]
    fn documents_are_valid_json_ld() {
        for doc in guide_structured_data(&grinding(), &SiteConfig::default()) {
            let value = json(&doc);
            assert_eq!(value["@context"], SCHEMA_ORG);
            assert_eq!(value["@type"], doc.type_name());
        }
    }

    #[test]
    fn title_and_url_consistent_across_documents() {
        let config = SiteConfig::default();
        let g = grinding();
        let docs = guide_structured_data(&g, &config);
        let meta = guide_metadata(&g, &config);

        let article = json(&docs[0]);
        let course = json(&docs[1]);
        let howto = json(&docs[3]);
        assert_eq!(article["headline"], meta.open_graph.title.as_str());
        assert_eq!(course["name"], article["headline"]);
        assert_eq!(howto["name"], article["headline"]);
        assert_eq!(article["url"], meta.canonical_url.as_str());
        assert_eq!(course["url"], article["url"]);
        assert_eq!(article["description"], meta.description.as_str());
    }

    #[test]
    fn breadcrumb_terminates_with_title() {
        let docs = guide_structured_data(&grinding(), &SiteConfig::default());
        let crumbs = json(&docs[2]);
        let items = crumbs["itemListElement"].as_array().unwrap();
        let last = items.last().unwrap();
        assert_eq!(last["@type"], "ListItem");
        assert_eq!(last["name"], "Grinding Guide");
        assert_eq!(last["position"], 3);
        assert_eq!(items[0]["item"], "https://guides.example.com/");
    }

    #[test]
    fn script_close_is_escaped() {
        let mut g = grinding();
        g.title = "Etch </script><script>alert(1)".to_string();
        let docs = guide_structured_data(&g, &SiteConfig::default());
        let raw = to_json_ld(&docs[0]).unwrap();
        assert!(!raw.contains("</script>"));
        assert_eq!(json(&docs[0])["headline"], "Etch </script><script>alert(1)");
    }

    #[test]
    fn optional_article_fields_omitted() {
        let docs = guide_structured_data(&grinding(), &SiteConfig::default());
        let article = json(&docs[0]);
        assert!(article.get("image").is_none());
        assert!(article.get("datePublished").is_none());
        assert!(article["publisher"].get("logo").is_none());
        assert_eq!(article["timeRequired"], "PT1M");
    }

    #[test]
    fn modified_defaults_to_published() {
        let mut g = grinding();
        g.published = Some("2024-03-01".to_string());
        let article = json(&guide_structured_data(&g, &SiteConfig::default())[0]);
        assert_eq!(article["dateModified"], "2024-03-01");
    }
}
