use runeterra_backend::api;
use runeterra_backend::config::{RuneterraConfig, RuneterraPaths};
use runeterra_backend::database::Database;
use runeterra_backend::posting::{CreatePostInput, CreateReplyInput};
use serde_json::json;
use tempfile::tempdir;
use tokio::time::{sleep, Duration};

fn next_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .expect("bind ephemeral port")
        .local_addr()
        .unwrap()
        .port()
}

async fn wait_for_health(base_url: &str) {
    let client = reqwest::Client::new();
    for _ in 0..50 {
        if let Ok(resp) = client.get(format!("{base_url}/health")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        sleep(Duration::from_millis(100)).await;
    }
    panic!("server did not become healthy in time");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn rest_roundtrip_covers_floors_attribution_and_likes() {
    let temp = tempdir().expect("tempdir");
    let port = next_port();
    let paths = RuneterraPaths::from_base_dir(temp.path()).expect("paths");
    paths.ensure_directories().expect("dirs");
    let config = RuneterraConfig::new(port, paths.clone());

    let database = Database::connect(&paths).expect("database");
    database.ensure_migrations().expect("migrations");

    let server_config = config.clone();
    let server_database = database.clone();
    let server = tokio::spawn(async move {
        let _ = api::serve_http(server_config, server_database).await;
    });

    let base_url = format!("http://127.0.0.1:{port}");
    wait_for_health(&base_url).await;

    let client = reqwest::Client::new();

    // Register an account; profile defaults apply.
    let user: serde_json::Value = client
        .post(format!("{base_url}/users/register"))
        .json(&json!({ "username": "德邦总管", "password": "changeme" }))
        .send()
        .await
        .expect("register response")
        .json()
        .await
        .expect("user json");
    let user_id = user["id"].as_str().expect("user id").to_string();
    assert_eq!(user["rank"], "坚韧黑铁");

    // Create a post attributed to that account.
    let post: serde_json::Value = client
        .post(format!("{base_url}/posts"))
        .json(&CreatePostInput {
            title: "德玛西亚招新".to_string(),
            content: "人在德玛，刚下战马".to_string(),
            category: "plaza".to_string(),
            user_id: Some(user_id.clone()),
            ..Default::default()
        })
        .send()
        .await
        .expect("create post response")
        .json()
        .await
        .expect("post json");
    let post_id = post["id"].as_str().expect("post id").to_string();
    assert_eq!(post["username"], "德邦总管");

    // Three un-pinned replies take floors 1..3, the second one attributed by
    // free-text username (get-or-create).
    let mut reply_ids = Vec::new();
    for (content, username) in [
        ("前排", None),
        ("二楼占座", Some("诺克萨斯之手")),
        ("三楼路过", None),
    ] {
        let reply: serde_json::Value = client
            .post(format!("{base_url}/posts/{post_id}/replies"))
            .json(&CreateReplyInput {
                content: content.to_string(),
                username: username.map(str::to_string),
                ..Default::default()
            })
            .send()
            .await
            .expect("create reply response")
            .json()
            .await
            .expect("reply json");
        reply_ids.push(reply["id"].as_str().expect("reply id").to_string());
    }

    let replies: Vec<serde_json::Value> = client
        .get(format!("{base_url}/posts/{post_id}/replies"))
        .send()
        .await
        .expect("list replies response")
        .json()
        .await
        .expect("replies json");
    let floors: Vec<i64> = replies
        .iter()
        .map(|reply| reply["floor_number"].as_i64().unwrap())
        .collect();
    assert_eq!(floors, vec![1, 2, 3]);
    assert_eq!(replies[1]["username"], "诺克萨斯之手");

    // The manufactured account is real and resolving the name again returns
    // the same id.
    let resolved: serde_json::Value = client
        .post(format!("{base_url}/users/resolve"))
        .json(&json!({ "username": "诺克萨斯之手" }))
        .send()
        .await
        .expect("resolve response")
        .json()
        .await
        .expect("resolved json");
    assert_eq!(
        resolved["id"].as_str(),
        replies[1]["user_id"].as_str(),
        "resolve must return the account created for the reply"
    );

    // Drag-reorder: [r3, r1, r2] re-anchors floors and sort order.
    let reorder_status = client
        .put(format!("{base_url}/posts/{post_id}/replies/order"))
        .json(&json!({
            "ordered_reply_ids": [reply_ids[2], reply_ids[0], reply_ids[1]]
        }))
        .send()
        .await
        .expect("reorder response")
        .status();
    assert!(reorder_status.is_success());

    let replies: Vec<serde_json::Value> = client
        .get(format!("{base_url}/posts/{post_id}/replies"))
        .send()
        .await
        .expect("list replies response")
        .json()
        .await
        .expect("replies json");
    let order: Vec<(&str, i64, i64)> = replies
        .iter()
        .map(|reply| {
            (
                reply["id"].as_str().unwrap(),
                reply["floor_number"].as_i64().unwrap(),
                reply["sort_order"].as_i64().unwrap(),
            )
        })
        .collect();
    assert_eq!(
        order,
        vec![
            (reply_ids[2].as_str(), 1, 0),
            (reply_ids[0].as_str(), 2, 1),
            (reply_ids[1].as_str(), 3, 2),
        ]
    );

    // A reorder naming an unknown reply must reject the whole batch.
    let bad_reorder = client
        .put(format!("{base_url}/posts/{post_id}/replies/order"))
        .json(&json!({ "ordered_reply_ids": [reply_ids[0], "bogus-reply"] }))
        .send()
        .await
        .expect("bad reorder response");
    assert_eq!(bad_reorder.status(), reqwest::StatusCode::BAD_REQUEST);

    // Editorial replies-count override, then clearing it.
    let post: serde_json::Value = client
        .put(format!("{base_url}/posts/{post_id}"))
        .json(&json!({ "custom_replies_count": 0 }))
        .send()
        .await
        .expect("override response")
        .json()
        .await
        .expect("post json");
    assert_eq!(post["replies_count"], 0);

    let post: serde_json::Value = client
        .put(format!("{base_url}/posts/{post_id}"))
        .json(&json!({ "custom_replies_count": "" }))
        .send()
        .await
        .expect("clear override response")
        .json()
        .await
        .expect("post json");
    assert_eq!(post["replies_count"], 3);

    // Like toggle flips both the pair and the counter.
    let like: serde_json::Value = client
        .post(format!("{base_url}/posts/{post_id}/like"))
        .json(&json!({ "user_id": user_id }))
        .send()
        .await
        .expect("like response")
        .json()
        .await
        .expect("like json");
    assert_eq!(like["liked"], true);

    let like: serde_json::Value = client
        .get(format!(
            "{base_url}/posts/{post_id}/like?user_id={user_id}"
        ))
        .send()
        .await
        .expect("like status response")
        .json()
        .await
        .expect("like json");
    assert_eq!(like["liked"], true);

    let like: serde_json::Value = client
        .post(format!("{base_url}/posts/{post_id}/like"))
        .json(&json!({ "user_id": user_id }))
        .send()
        .await
        .expect("unlike response")
        .json()
        .await
        .expect("like json");
    assert_eq!(like["liked"], false);

    server.abort();
    let _ = server.await;
}
