//! Basic example demonstrating GET, POST and status checking.
//!
//! This example shows how to:
//! - Build a session with shared headers and full request/response logging
//! - Make GET requests with query parameters
//! - Make POST requests with a JSON payload
//! - Inspect a response that failed the status expectation
//!
//! Run with: `cargo run --example basic_call`

use rested::{Error, Opts, Params, Session};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
#[allow(dead_code)]
struct Post {
    #[serde(rename = "userId")]
    user_id: u32,
    id: u32,
    title: String,
    body: String,
}

#[derive(Debug, Serialize)]
struct NewPost {
    title: String,
    body: String,
    #[serde(rename = "userId")]
    user_id: u32,
}

fn main() -> Result<(), Error> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter("rested=info,basic_call=info")
        .init();

    let session = Session::builder()
        .default_header("Accept", "application/json")?
        .log(true)
        .build()?;

    println!("=== GET Request Example ===");
    let params = Params::new().with("userId", "1");
    let mut posts: Vec<Post> = Vec::new();
    let response = session.get(
        "https://jsonplaceholder.typicode.com/posts",
        Some(&params),
        Some(&mut posts),
        None,
    )?;

    println!("Fetched {} posts for user 1", posts.len());
    if let Some(first) = posts.first() {
        println!("First title: {}", first.title);
    }
    println!("Status code: {}", response.status());
    println!("Request latency: {:?}", response.latency());
    println!();

    println!("=== POST Request Example ===");
    let new_post = NewPost {
        title: "My New Post".to_string(),
        body: "This is the content of my new post!".to_string(),
        user_id: 1,
    };

    let opts = Opts::new().expected_status(201);
    let mut created = Post::default();
    session.post(
        "https://jsonplaceholder.typicode.com/posts",
        Some(&new_post),
        Some(&mut created),
        Some(&opts),
    )?;
    println!("Created post ID: {}", created.id);
    println!();

    println!("=== Unexpected Status Example ===");
    let opts = Opts::new().expected_status(200);
    match session.get(
        "https://jsonplaceholder.typicode.com/posts/0",
        None,
        None,
        Some(&opts),
    ) {
        Ok(response) => println!("Unexpectedly found: {}", response.raw_text()),
        Err(Error::UnexpectedStatus { expected, response }) => {
            println!("Expected {}, got {}", expected, response.status());
            println!("Body: {:?}", response.raw_text());
        }
        Err(e) => return Err(e),
    }

    Ok(())
}
