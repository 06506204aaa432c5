#![cfg(all(feature = "sqlite", feature = "derive"))]

mod common;

use common::*;
use dbmap::{OrmResult, Value};
use std::collections::HashMap;

#[tokio::test]
async fn insert_count_replace_delete() -> OrmResult<()> {
    let db = open_with_users().await?;
    let users = test_users();
    let t = db.table(USER_TABLE);

    assert_eq!(t.count_all().await?, 3);
    assert_eq!(t.count("userid=?", (&users[0].userid,)).await?, 1);
    assert_eq!(t.count("userid=?", ("xx",)).await?, 0);

    let mut user1 = User::default();
    t.select_all()
        .filter("userid=?", (&users[0].userid,))
        .one(&mut user1)
        .await?;
    let mut expected = users[0].clone();
    expected.id = user1.id;
    assert_eq!(user1, expected);

    user1.nickname = "new_nickname".into();
    user1.password = "new_password".into();
    user1.update_time = "2019-02-01 00:00:00".into();
    t.replace(&user1).await?;

    let mut user2 = User::default();
    t.select_all().filter("id=?", (user1.id,)).one(&mut user2).await?;
    assert_eq!(user1, user2);
    assert_eq!(t.count_all().await?, 3);

    let deleted = t.delete("userid=?", (&users[0].userid,)).await?;
    assert_eq!(deleted, 1);
    assert_eq!(t.count("userid=?", (&users[0].userid,)).await?, 0);
    assert_eq!(t.count_all().await?, 2);
    Ok(())
}

#[tokio::test]
async fn insert_reports_generated_id() -> OrmResult<()> {
    let db = open().await?;
    let users = test_users();

    let first = db.table(USER_TABLE).insert(&users[0]).await?;
    let second = db.table(USER_TABLE).insert(&users[1]).await?;
    assert_eq!(first.rows_affected, 1);
    let (a, b) = (first.last_insert_id.unwrap(), second.last_insert_id.unwrap());
    assert!(b > a);

    // the sentinel id was not sent
    let mut stored = User::default();
    db.table(USER_TABLE)
        .select_all()
        .filter("id=?", (a,))
        .one(&mut stored)
        .await?;
    assert_eq!(stored.userid, users[0].userid);
    Ok(())
}

#[tokio::test]
async fn select_all_and_order() -> OrmResult<()> {
    let db = open_with_users().await?;
    let users = test_users();
    let t = db.table(USER_TABLE);

    let mut all: Vec<User> = Vec::new();
    t.select_all().all(&mut all).await?;
    assert_eq!(all.len(), 3);

    let mut asc: Vec<User> = Vec::new();
    t.select_all().asc(&["id"]).all(&mut asc).await?;
    let ids: Vec<_> = asc.iter().map(|u| u.userid.as_str()).collect();
    assert_eq!(ids, [&users[0].userid, &users[1].userid, &users[2].userid]);

    let mut desc: Vec<User> = Vec::new();
    t.select_all().desc(&["id"]).all(&mut desc).await?;
    let ids: Vec<_> = desc.iter().map(|u| u.userid.as_str()).collect();
    assert_eq!(ids, [&users[2].userid, &users[1].userid, &users[0].userid]);

    // same query twice, same order
    let mut again: Vec<User> = Vec::new();
    t.select_all().desc(&["id"]).all(&mut again).await?;
    assert_eq!(desc, again);
    Ok(())
}

#[tokio::test]
async fn select_page() -> OrmResult<()> {
    let db = open_with_users().await?;
    let users = test_users();

    let mut page: Vec<User> = Vec::new();
    db.table(USER_TABLE)
        .select_all()
        .desc(&["id"])
        .offset(1)
        .limit(10)
        .all(&mut page)
        .await?;
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].userid, users[1].userid);
    assert_eq!(page[1].userid, users[0].userid);

    let mut first: Vec<User> = Vec::new();
    db.table(USER_TABLE)
        .select_all()
        .asc(&["id"])
        .limit(1)
        .all(&mut first)
        .await?;
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].userid, users[0].userid);
    Ok(())
}

#[tokio::test]
async fn pages_concatenate_to_the_full_result() -> OrmResult<()> {
    let db = open_with_users().await?;
    for user in test_users() {
        let mut again = user.clone();
        again.userid.push('9');
        db.table(USER_TABLE).insert(&again).await?;
    }
    let t = db.table(USER_TABLE);

    let mut full: Vec<User> = Vec::new();
    t.select_all().desc(&["id"]).all(&mut full).await?;
    assert_eq!(full.len(), 6);

    for size in [1, 2, 4] {
        let mut pages: Vec<User> = Vec::new();
        let mut offset = 0;
        loop {
            let mut page: Vec<User> = Vec::new();
            t.select_all()
                .desc(&["id"])
                .offset(offset)
                .limit(size)
                .all(&mut page)
                .await?;
            if page.is_empty() {
                break;
            }
            assert!(page.len() as u64 <= size);
            offset += page.len() as u64;
            pages.extend(page);
        }
        assert_eq!(pages, full, "page size {size}");
    }
    Ok(())
}

#[tokio::test]
async fn all_reuses_and_truncates_destination() -> OrmResult<()> {
    let db = open_with_users().await?;

    let mut users = vec![User::default(); 5];
    users[0].session = Some("kept".into());
    db.table(USER_TABLE)
        .select_all()
        .filter("nickname<>?", ("zc",))
        .asc(&["id"])
        .all(&mut users)
        .await?;
    assert_eq!(users.len(), 2);
    assert_eq!(users[0].session.as_deref(), Some("kept"));
    assert_eq!(users[0].nickname, "eschao");

    db.table(USER_TABLE)
        .select_all()
        .filter("userid=?", ("nobody",))
        .all(&mut users)
        .await?;
    assert!(users.is_empty());
    Ok(())
}

#[tokio::test]
async fn select_some_columns() -> OrmResult<()> {
    let db = open_with_users().await?;
    let users = test_users();

    let mut user = User::default();
    db.table(USER_TABLE)
        .select(&["nickname", "password"])
        .filter("userid=?", (&users[0].userid,))
        .one(&mut user)
        .await?;
    assert_eq!(user.nickname, users[0].nickname);
    assert_eq!(user.password, users[0].password);
    assert_eq!(user.userid, "");
    assert_eq!(user.update_time, "");
    assert_eq!(user.id, 0);
    Ok(())
}

#[tokio::test]
async fn one_without_match_is_not_found() -> OrmResult<()> {
    let db = open_with_users().await?;

    let mut user = User::default();
    let err = db
        .table(USER_TABLE)
        .select_all()
        .filter("userid=?", ("nobody",))
        .one(&mut user)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(user, User::default());
    Ok(())
}

#[tokio::test]
async fn update_record_and_columns() -> OrmResult<()> {
    let db = open().await?;
    let t = db.table(USER_TABLE);
    t.insert(&test_users()[0]).await?;

    let mut user1 = User::default();
    t.select_all().one(&mut user1).await?;

    // every column
    user1.nickname = "nickname1".into();
    user1.password = "password1".into();
    user1.update_time = "2019-02-01 00:00:00".into();
    let res = t.update("id=?", (user1.id,)).value(&user1).await?;
    assert_eq!(res.rows_affected, 1);
    let mut user2 = User::default();
    t.select_all().filter("id=?", (user1.id,)).one(&mut user2).await?;
    assert_eq!(user1, user2);

    // only the named columns are written
    let mut changed = user2.clone();
    changed.nickname = "ignored".into();
    changed.password = "password2".into();
    changed.update_time = "2019-03-01 00:00:00".into();
    t.update("id=?", (user2.id,))
        .set(&["password", "update_time"])
        .value(&changed)
        .await?;
    let mut user3 = User::default();
    t.select_all().filter("id=?", (user2.id,)).one(&mut user3).await?;
    assert_eq!(user3.nickname, "nickname1");
    assert_eq!(user3.password, "password2");
    assert_eq!(user3.update_time, "2019-03-01 00:00:00");

    // explicit values
    t.update("id=?", (user2.id,))
        .set(&["password", "update_time"])
        .values(("password3", "2019-04-01 00:00:00"))
        .await?;
    let mut user4 = User::default();
    t.select_all().filter("id=?", (user2.id,)).one(&mut user4).await?;
    assert_eq!(user4.password, "password3");
    assert_eq!(user4.update_time, "2019-04-01 00:00:00");

    // value map
    let map: HashMap<String, &str> = [
        ("password".to_string(), "password4"),
        ("update_time".to_string(), "2019-05-01 00:00:00"),
    ]
    .into_iter()
    .collect();
    t.update("id=?", (user2.id,)).value_map(&map).await?;
    let mut user5 = User::default();
    t.select_all().filter("id=?", (user2.id,)).one(&mut user5).await?;
    assert_eq!(user5.password, "password4");
    assert_eq!(user5.update_time, "2019-05-01 00:00:00");
    assert_eq!(user5.nickname, "nickname1");
    Ok(())
}

#[tokio::test]
async fn update_errors_write_nothing() -> OrmResult<()> {
    let db = open_with_users().await?;
    let t = db.table(USER_TABLE);

    let err = t
        .update("userid=?", ("15600362000",))
        .values(("x",))
        .await
        .unwrap_err();
    assert!(err.is_shape());

    let err = t
        .update("userid=?", ("15600362000",))
        .set(&["password", "nickname"])
        .values(("x",))
        .await
        .unwrap_err();
    assert!(err.is_shape());

    let map: HashMap<String, Value> = [("no_such".to_string(), Value::Text("x".into()))]
        .into_iter()
        .collect();
    let err = t.update("1=1", ()).value_map(&map).await.unwrap_err();
    assert!(err.is_shape());

    let err = t
        .update("1=1", ())
        .value_map(&HashMap::<String, Value>::new())
        .await
        .unwrap_err();
    assert!(err.is_shape());

    assert_eq!(t.count("password=?", ("x",)).await?, 0);
    Ok(())
}

#[tokio::test]
async fn update_from_form() -> OrmResult<()> {
    let db = open_with_users().await?;
    let schema = db.table_schema(USER_TABLE)?;

    let form: HashMap<String, Vec<String>> = [
        ("nick".to_string(), vec!["from_form".to_string(), "second".to_string()]),
        ("password".to_string(), vec!["secret".to_string()]),
        ("nickname".to_string(), vec!["not the alias".to_string()]),
        ("update_time".to_string(), vec![]),
        ("csrf".to_string(), vec!["token".to_string()]),
    ]
    .into_iter()
    .collect();

    let (columns, values) = schema.columns_from_form(&form);
    assert_eq!(columns, ["nickname", "password"]);
    let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
    db.table(USER_TABLE)
        .update("userid=?", ("15600362000",))
        .set(&columns)
        .values(values)
        .await?;

    let map = schema.column_map_from_form(&form);
    db.table(USER_TABLE)
        .update("userid=?", ("12520343000",))
        .value_map(&map)
        .await?;

    for userid in ["15600362000", "12520343000"] {
        let mut user = User::default();
        db.table(USER_TABLE)
            .select_all()
            .filter("userid=?", (userid,))
            .one(&mut user)
            .await?;
        assert_eq!(user.nickname, "from_form");
        assert_eq!(user.password, "secret");
    }
    Ok(())
}

#[tokio::test]
async fn unregistered_table_fails_on_use() -> OrmResult<()> {
    let db = open().await?;

    // building is fine, the first terminal call reports it
    let select = db.table("ghost").select_all().filter("id=?", (1,));
    assert!(matches!(select.to_sql(), Err(dbmap::OrmError::NotRegistered(_))));

    let err = db.table("ghost").count_all().await.unwrap_err();
    assert!(matches!(err, dbmap::OrmError::NotRegistered(ref t) if t == "ghost"));

    let err = db.table("ghost").insert(&test_users()[0]).await.unwrap_err();
    assert!(matches!(err, dbmap::OrmError::NotRegistered(_)));
    Ok(())
}

#[tokio::test]
async fn count_matches_selected_rows() -> OrmResult<()> {
    let db = open_with_users().await?;
    let t = db.table(USER_TABLE);

    for (clause, arg) in [
        ("nickname=?", "zc"),
        ("userid>?", "12600000000"),
        ("update_time<?", "2019-01-02 12:00:00"),
        ("password=?", "none"),
    ] {
        let mut rows: Vec<User> = Vec::new();
        t.select_all().filter(clause, (arg,)).all(&mut rows).await?;
        assert_eq!(t.count(clause, (arg,)).await?, rows.len() as u64, "{clause}");
    }
    Ok(())
}
