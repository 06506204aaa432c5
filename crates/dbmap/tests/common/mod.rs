#![allow(dead_code)]

use dbmap::{Database, OrmResult, Record, SqliteClient};

pub const USER_TABLE: &str = "user";
pub const USER_LOGIN_TABLE: &str = "user_login";
pub const USER_OAUTH_TABLE: &str = "user_oauth";

#[derive(Debug, Default, Clone, PartialEq, Record)]
pub struct User {
    #[orm(
        db = "id",
        sqlite = "INTEGER PRIMARY KEY AUTOINCREMENT",
        mysql = "int NOT NULL PRIMARY KEY AUTO_INCREMENT",
        postgres = "BIGSERIAL PRIMARY KEY"
    )]
    pub id: i64,
    #[orm(db = "userid", sqlite = "TEXT NOT NULL", mysql = "varchar(32) NOT NULL", postgres = "TEXT NOT NULL")]
    pub userid: String,
    #[orm(db = "nickname", form = "nick", sqlite = "TEXT", mysql = "varchar(64) NOT NULL DEFAULT ''", postgres = "TEXT")]
    pub nickname: String,
    #[orm(db = "password", sqlite = "TEXT", mysql = "varchar(32) NOT NULL DEFAULT ''", postgres = "TEXT")]
    pub password: String,
    #[orm(
        db = "update_time",
        sqlite = "INTEGER",
        mysql = "datetime NOT NULL DEFAULT '2000-01-01 00:00:00'",
        postgres = "TEXT"
    )]
    pub update_time: String,
    /// Not persisted.
    pub session: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Record)]
pub struct UserLogin {
    #[orm(
        column = "id",
        sqlite = "INTEGER PRIMARY KEY AUTOINCREMENT",
        mysql = "int NOT NULL PRIMARY KEY AUTO_INCREMENT"
    )]
    pub id: i64,
    #[orm(column = "userid", sqlite = "TEXT UNIQUE NOT NULL", mysql = "varchar(32) NOT NULL UNIQUE")]
    pub userid: String,
    #[orm(column = "oauth_id", sqlite = "TEXT UNIQUE NOT NULL", mysql = "varchar(64) NOT NULL UNIQUE DEFAULT ''")]
    pub oauth_id: String,
    #[orm(column = "last_login", sqlite = "INTEGER", mysql = "datetime NOT NULL DEFAULT '2000-01-01 00:00:00'")]
    pub last_login: String,
    #[orm(column = "last_ip", sqlite = "INTEGER", mysql = "int NOT NULL DEFAULT 0")]
    pub last_ip: i64,
    #[orm(column = "update_time", sqlite = "INTEGER", mysql = "datetime NOT NULL DEFAULT '2000-01-01 00:00:00'")]
    pub update_time: String,
}

#[derive(Debug, Default, Clone, PartialEq, Record)]
pub struct UserOAuth {
    #[orm(
        col = "id",
        sqlite = "INTEGER PRIMARY KEY AUTOINCREMENT",
        mysql = "int NOT NULL PRIMARY KEY AUTO_INCREMENT"
    )]
    pub id: i64,
    #[orm(col = "userid", sqlite = "TEXT UNIQUE NOT NULL", mysql = "varchar(32) NOT NULL UNIQUE")]
    pub userid: String,
    #[orm(col = "oauth_id", sqlite = "TEXT UNIQUE NOT NULL", mysql = "varchar(64) NOT NULL UNIQUE")]
    pub oauth_id: String,
    #[orm(col = "app", sqlite = "TEXT", mysql = "varchar(16) NOT NULL DEFAULT ''")]
    pub app: String,
    #[orm(col = "url", sqlite = "TEXT", mysql = "varchar(256) NOT NULL DEFAULT ''")]
    pub url: String,
    #[orm(col = "token", sqlite = "TEXT", mysql = "varchar(64) NOT NULL DEFAULT ''")]
    pub token: String,
    #[orm(col = "expire_time", sqlite = "INTEGER", mysql = "datetime NOT NULL DEFAULT '2000-01-01 00:00:00'")]
    pub expire_time: String,
    #[orm(col = "update_time", sqlite = "INTEGER", mysql = "datetime NOT NULL DEFAULT '2000-01-01 00:00:00'")]
    pub update_time: String,
}

fn user(userid: &str, nickname: &str, update_time: &str) -> User {
    User {
        id: -1,
        userid: userid.to_string(),
        nickname: nickname.to_string(),
        password: userid.to_string(),
        update_time: update_time.to_string(),
        session: None,
    }
}

pub fn test_users() -> Vec<User> {
    vec![
        user("15600362000", "eschao", "2019-01-01 00:00:00"),
        user("12520343000", "chaozh", "2019-01-02 00:00:00"),
        user("12901060000", "zc", "2019-01-03 00:00:00"),
    ]
}

pub fn test_user_logins() -> Vec<UserLogin> {
    [
        ("15600362000", "qq_15600362000", "2019-07-01 00:00:00", 1024),
        ("12520343000", "wechat_12520343000", "2019-07-02 00:00:00", 2048),
        ("12901060000", "weibo_12901060000", "2019-07-03 00:00:00", 3096),
    ]
    .into_iter()
    .map(|(userid, oauth_id, at, ip)| UserLogin {
        id: -1,
        userid: userid.to_string(),
        oauth_id: oauth_id.to_string(),
        last_login: at.to_string(),
        last_ip: ip,
        update_time: at.to_string(),
    })
    .collect()
}

pub fn test_user_oauths() -> Vec<UserOAuth> {
    [
        ("15600362000", "qq", "2020-07-01 00:00:00", "2019-07-01 00:00:00"),
        ("12520343000", "wechat", "2020-07-02 00:00:00", "2019-07-02 00:00:00"),
        ("12901060000", "weibo", "2020-07-03 00:00:00", "2019-07-03 00:00:00"),
    ]
    .into_iter()
    .map(|(userid, app, expire, at)| UserOAuth {
        id: -1,
        userid: userid.to_string(),
        oauth_id: format!("{app}_{userid}"),
        app: app.to_string(),
        url: format!("{app}_url"),
        token: format!("{app}_token"),
        expire_time: expire.to_string(),
        update_time: at.to_string(),
    })
    .collect()
}

/// In-memory database with all three tables registered and created.
pub async fn open() -> OrmResult<Database<SqliteClient>> {
    let mut db = Database::new(SqliteClient::open_in_memory()?);
    db.register::<User>(USER_TABLE)?;
    db.register::<UserLogin>(USER_LOGIN_TABLE)?;
    db.register::<UserOAuth>(USER_OAUTH_TABLE)?;
    db.create_tables().await?;
    Ok(db)
}

/// [`open`] plus the three test users, in order.
pub async fn open_with_users() -> OrmResult<Database<SqliteClient>> {
    let db = open().await?;
    for user in test_users() {
        db.table(USER_TABLE).insert(&user).await?;
    }
    Ok(db)
}
