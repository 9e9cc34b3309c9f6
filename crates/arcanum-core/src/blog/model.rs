//! Blog domain models.
//!
//! Field names follow the backend's camelCase wire format; timestamps are
//! carried as the backend's formatted strings rather than parsed dates.

use serde::{Deserialize, Serialize};

/// A blog article as returned by the backend.
///
/// List endpoints omit `content`; detail endpoints include it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub article_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_ids: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}

/// An article row in a list view, with `summary` always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleListItem {
    #[serde(flatten)]
    pub article: Article,
    pub summary: String,
}

impl From<Article> for ArticleListItem {
    fn from(mut article: Article) -> Self {
        // The summary moves to the outer field; leaving it set on the inner
        // article would serialize a duplicate key through the flatten.
        let summary = article.summary.take().unwrap_or_default();
        Self { article, summary }
    }
}

/// A materialized page of articles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleListResult {
    pub list: Vec<ArticleListItem>,
    pub total: i64,
    pub page_num: u32,
    pub page_size: u32,
}

/// A blog category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub category_id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<i64>,
}

/// A blog tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub tag_id: i64,
    pub name: String,
}

/// A comment on an article. Replies are nested under `children`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub comment_id: i64,
    pub article_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    pub nickname: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
    #[serde(default)]
    pub children: Vec<Comment>,
}

/// A materialized comment thread for one article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentListResult {
    pub list: Vec<Comment>,
    pub total: i64,
}

/// Payload for submitting a new comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentPayload {
    pub article_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

/// One entry in the site timeline section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub year: String,
    pub title: String,
    pub description: String,
}

/// One entry in the site principles section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrincipleEntry {
    pub title: String,
    pub description: String,
}

/// Site-wide presentation metadata.
///
/// The backend endpoint for this is best-effort: consumers fall back to
/// [`SiteInfo::fallback`] when the fetch fails, and merge fetched fields over
/// the fallback when it succeeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteInfo {
    pub hero_title: String,
    pub hero_subtitle: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hero_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hero_kicker: Option<String>,
    pub cta_text: String,
    pub cta_link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_cta_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_cta_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured_category_ids: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub showcase_tag_ids: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline: Option<Vec<TimelineEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principles: Option<Vec<PrincipleEntry>>,
}

impl SiteInfo {
    /// The hardcoded default shown when the site-info endpoint is
    /// unavailable.
    pub fn fallback() -> Self {
        Self {
            hero_title: "简栈 · 以简驭繁的个人博客系统".to_string(),
            hero_subtitle: "写给认真经营内容的人".to_string(),
            hero_description: Some(
                "简栈聚焦内容架构、知识整理与工程策略，让后端的真实数据成为轻盈的阅读体验。"
                    .to_string(),
            ),
            hero_kicker: Some("简栈志 · 你的内容生产栈".to_string()),
            cta_text: "立即探索".to_string(),
            cta_link: "/article".to_string(),
            secondary_cta_text: Some("关于本站".to_string()),
            secondary_cta_link: Some("/about".to_string()),
            featured_category_ids: None,
            showcase_tag_ids: None,
            contact_email: Some("hello@jianzhansite.com".to_string()),
            timeline: Some(vec![
                TimelineEntry {
                    year: "2023".to_string(),
                    title: "简栈构想浮现".to_string(),
                    description: "提出「以简驭繁」的写作工作流，梳理个人知识栈与前端展现方式。"
                        .to_string(),
                },
                TimelineEntry {
                    year: "2024".to_string(),
                    title: "与后端贯通".to_string(),
                    description: "完成文章、分类与标签模块的数据对接，确保管理端与前台体验一致。"
                        .to_string(),
                },
                TimelineEntry {
                    year: "2025".to_string(),
                    title: "自托管生产可用".to_string(),
                    description: "加入权限、通知与缓存策略，让自托管部署也具备可观测性与稳定性。"
                        .to_string(),
                },
            ]),
            principles: Some(vec![
                PrincipleEntry {
                    title: "以简为纲".to_string(),
                    description: "所有能力围绕写作与发布的关键路径设计，避免多余干扰。".to_string(),
                },
                PrincipleEntry {
                    title: "数据自洽".to_string(),
                    description: "前后端统一字段语义与校验规则，保证内容在任意终端都稳定可用。"
                        .to_string(),
                },
                PrincipleEntry {
                    title: "持续复用".to_string(),
                    description: "文章、组件与写作模板都可复用，方便个人长期积累知识资产。"
                        .to_string(),
                },
            ]),
        }
    }

    /// Field-level merge of fetched values over this one.
    ///
    /// Optional fields keep the fallback value when the fetched payload left
    /// them unset; required fields always come from `fetched`.
    pub fn merged_with(self, fetched: PartialSiteInfo) -> Self {
        Self {
            hero_title: fetched.hero_title.unwrap_or(self.hero_title),
            hero_subtitle: fetched.hero_subtitle.unwrap_or(self.hero_subtitle),
            hero_description: fetched.hero_description.or(self.hero_description),
            hero_kicker: fetched.hero_kicker.or(self.hero_kicker),
            cta_text: fetched.cta_text.unwrap_or(self.cta_text),
            cta_link: fetched.cta_link.unwrap_or(self.cta_link),
            secondary_cta_text: fetched.secondary_cta_text.or(self.secondary_cta_text),
            secondary_cta_link: fetched.secondary_cta_link.or(self.secondary_cta_link),
            featured_category_ids: fetched.featured_category_ids.or(self.featured_category_ids),
            showcase_tag_ids: fetched.showcase_tag_ids.or(self.showcase_tag_ids),
            contact_email: fetched.contact_email.or(self.contact_email),
            timeline: fetched.timeline.or(self.timeline),
            principles: fetched.principles.or(self.principles),
        }
    }
}

/// Site metadata as actually returned by the backend, where every field may
/// be missing. Merged over [`SiteInfo::fallback`] by consumers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialSiteInfo {
    #[serde(default)]
    pub hero_title: Option<String>,
    #[serde(default)]
    pub hero_subtitle: Option<String>,
    #[serde(default)]
    pub hero_description: Option<String>,
    #[serde(default)]
    pub hero_kicker: Option<String>,
    #[serde(default)]
    pub cta_text: Option<String>,
    #[serde(default)]
    pub cta_link: Option<String>,
    #[serde(default)]
    pub secondary_cta_text: Option<String>,
    #[serde(default)]
    pub secondary_cta_link: Option<String>,
    #[serde(default)]
    pub featured_category_ids: Option<Vec<i64>>,
    #[serde(default)]
    pub showcase_tag_ids: Option<Vec<i64>>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub timeline: Option<Vec<TimelineEntry>>,
    #[serde(default)]
    pub principles: Option<Vec<PrincipleEntry>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_item_defaults_summary() {
        let article: Article = serde_json::from_str(
            r#"{"articleId":1,"title":"标题","categoryName":"随笔"}"#,
        )
        .unwrap();
        let item = ArticleListItem::from(article);
        assert_eq!(item.summary, "");
        assert_eq!(item.article.article_id, 1);
    }

    #[test]
    fn test_list_item_serializes_a_single_summary_key() {
        let article = Article {
            summary: Some("一段摘要".to_string()),
            ..serde_json::from_str::<Article>(r#"{"articleId":1,"title":"标题"}"#).unwrap()
        };
        let item = ArticleListItem::from(article);

        assert_eq!(item.summary, "一段摘要");
        assert_eq!(item.article.summary, None);

        let json = serde_json::to_string(&item).unwrap();
        assert_eq!(json.matches("\"summary\"").count(), 1);
    }

    #[test]
    fn test_site_info_merge_prefers_fetched_fields() {
        let fetched = PartialSiteInfo {
            hero_title: Some("新标题".to_string()),
            contact_email: None,
            ..Default::default()
        };
        let merged = SiteInfo::fallback().merged_with(fetched);
        assert_eq!(merged.hero_title, "新标题");
        assert_eq!(merged.contact_email.as_deref(), Some("hello@jianzhansite.com"));
    }
}
