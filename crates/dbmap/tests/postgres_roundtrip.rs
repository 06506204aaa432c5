#![cfg(all(feature = "postgres", feature = "derive"))]

use dbmap::{Database, DatabaseConfig, Dialect, OrmResult, Record};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Default, Clone, PartialEq, Record)]
struct Article {
    #[orm(db = "id", sqlite = "INTEGER PRIMARY KEY AUTOINCREMENT", postgres = "BIGSERIAL PRIMARY KEY")]
    id: i64,
    #[orm(db = "slug", postgres = "TEXT NOT NULL UNIQUE")]
    slug: String,
    #[orm(db = "title", postgres = "TEXT NOT NULL")]
    title: String,
    #[orm(db = "views", postgres = "BIGINT NOT NULL DEFAULT 0")]
    views: i64,
    #[orm(db = "published", postgres = "BOOLEAN NOT NULL DEFAULT FALSE")]
    published: bool,
    #[orm(db = "summary", postgres = "TEXT")]
    summary: Option<String>,
}

fn article(slug: &str, views: i64) -> Article {
    Article {
        id: 0,
        slug: slug.to_string(),
        title: format!("About {slug}"),
        views,
        published: views > 0,
        summary: None,
    }
}

#[tokio::test]
async fn postgres_roundtrip() -> OrmResult<()> {
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL is not set; skipping postgres_roundtrip");
        return Ok(());
    }
    let config = DatabaseConfig::from_env()?;
    if config.dialect != Dialect::Postgres {
        eprintln!("DATABASE_URL is not a postgres url; skipping postgres_roundtrip");
        return Ok(());
    }

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before UNIX_EPOCH")
        .as_nanos();
    let name = format!("dbmap_article_{}_{}", std::process::id(), nanos);

    let mut db = Database::new(config.connect_postgres().await?);
    db.register::<Article>(&name)?;
    db.create_table(&name).await?;

    let t = db.table(&name);
    for a in [article("a", 3), article("b", 0), article("c", 7)] {
        t.insert(&a).await?;
    }
    assert_eq!(t.count_all().await?, 3);
    assert_eq!(t.count("views>? AND published=?", (1, true)).await?, 2);

    let mut rows: Vec<Article> = Vec::new();
    t.select_all().desc(&["views"]).limit(2).all(&mut rows).await?;
    let slugs: Vec<_> = rows.iter().map(|a| a.slug.as_str()).collect();
    assert_eq!(slugs, ["c", "a"]);

    let mut b = Article::default();
    t.select_all().filter("slug=?", ("b",)).one(&mut b).await?;
    b.summary = Some("now with a '?' inside".into());
    b.views = 11;
    t.update("id=?", (b.id,)).set(&["summary", "views"]).value(&b).await?;

    let mut stored = Article::default();
    t.select_all().filter("id=?", (b.id,)).one(&mut stored).await?;
    assert_eq!(stored, b);

    let tx = db.begin().await?;
    tx.table(&name).delete("", ()).await?;
    tx.rollback().await?;
    assert_eq!(db.table(&name).count_all().await?, 3);

    db.drop_table(&name).await?;
    Ok(())
}
