//! Shared fixtures for the integration tests

#![allow(dead_code)]

use serde_json::{Value, json};

/// A paginated API response with six users, two of them without gender
pub fn json0() -> Value {
    json!({
        "data": {
            "users": [
                {"id": 0, "name": "Vang Stout", "gender": "female"},
                {"id": 1, "name": "Jeannie Gaines", "gender": "male"},
                {"id": 2, "name": "Guzman Hunter", "gender": "female"},
                {"id": 3, "name": "Janine Gross"},
                {"id": 4, "name": "Clarke Patrick", "gender": "male"},
                {"id": 5, "name": "Whitney Mcfadden"},
            ],
            "start": 0,
            "size": 5,
            "total": 100,
        },
        "status": 0,
    })
}

/// The users of [`json0`] as assembled by a uid/name/gender item
pub fn users_result() -> Vec<Value> {
    vec![
        json!({"uid": 0, "name": "Vang Stout", "gender": "female"}),
        json!({"uid": 1, "name": "Jeannie Gaines", "gender": "male"}),
        json!({"uid": 2, "name": "Guzman Hunter", "gender": "female"}),
        json!({"uid": 3, "name": "Janine Gross", "gender": null}),
        json!({"uid": 4, "name": "Clarke Patrick", "gender": "male"}),
        json!({"uid": 5, "name": "Whitney Mcfadden", "gender": null}),
    ]
}

/// Articles where the last one has neither title nor content
pub const ARTICLES_PARTIAL: &str = r#"
<ul class="articles">
    <li class="article">
        <div class="title">Title 1</div>
        <div class="content">Content 1</div>
    </li>
    <li class="article">
        <div class="title">Title 2</div>
    </li>
    <li class="article">
    </li>
</ul>
"#;

/// Two complete articles
pub const ARTICLES: &str = r#"
<ul class="articles">
    <li class="article">
        <div class="title">Title 1</div>
        <div class="content">Content 1</div>
    </li>
    <li class="article">
        <div class="title">Title 2</div>
        <div class="content">Content 2</div>
    </li>
</ul>
"#;

/// Two articles, the second one without content
pub const ARTICLES_MISSING_CONTENT: &str = r#"
<ul class="articles">
    <li class="article">
        <div class="title">Title 1</div>
        <div class="content">Content 1</div>
    </li>
    <li class="article">
        <div class="title">Title 2</div>
    </li>
</ul>
"#;

/// A small RSS feed
pub const RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0">
    <channel>
        <title>Liftoff News</title>
        <link>http://liftoff.msfc.nasa.gov/</link>
        <item>
            <title>Star City</title>
            <link>http://liftoff.msfc.nasa.gov/news/2003/news-starcity.asp</link>
            <pubDate>Tue, 03 Jun 2003 09:39:21 GMT</pubDate>
            <guid>http://liftoff.msfc.nasa.gov/2003/06/03.html#item573</guid>
        </item>
        <item>
            <title>Space Exploration</title>
            <link>http://liftoff.msfc.nasa.gov/</link>
            <pubDate>Fri, 30 May 2003 11:06:42 GMT</pubDate>
            <guid>http://liftoff.msfc.nasa.gov/2003/05/30.html#item572</guid>
        </item>
    </channel>
</rss>
"#;

pub fn parse_xml(text: &str) -> sxd_document::Package {
    sxd_document::parser::parse(text.trim()).expect("Failed to parse XML fixture")
}
