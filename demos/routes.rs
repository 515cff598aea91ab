//! Lists the routes of a small application with their resolved middleware.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example routes
//!   cargo run --example routes -- users          (name filter)

use tsu_routes::{ListOptions, Manifest, RouteList};

const MANIFEST: &str = r#"
[middleware]
auth     = "App\\Http\\Middleware\\Authenticate"
throttle = "App\\Http\\Middleware\\ThrottleRequests"

[[filters]]
methods = ["POST", "PUT", "DELETE"]
regex   = "^/users"
name    = "csrf"

[[filters]]
methods = ["GET"]
pattern = "admin/*"
name    = "admin.audit"

[[controllers]]
class = "App\\Http\\Controllers\\UserController"
middleware = [
    { name = "auth",     except = ["index", "show"] },
    { name = "throttle", only   = ["store"] },
]

[[routes]]
methods = ["GET", "HEAD"]
uri     = "/users"
name    = "users.index"
action  = "App\\Http\\Controllers\\UserController@index"
middleware = ["web"]

[[routes]]
methods = ["POST"]
uri     = "/users"
name    = "users.store"
action  = "App\\Http\\Controllers\\UserController@store"
middleware = ["web"]

[[routes]]
methods = ["GET", "HEAD"]
uri     = "/users/{id}"
name    = "users.show"
action  = "App\\Http\\Controllers\\UserController@show"

[[routes]]
methods = ["GET", "HEAD"]
uri     = "/admin/stats"
domain  = "admin.example.com"
"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let (router, controllers) = MANIFEST.parse::<Manifest>()?.into_parts()?;

    let mut options = ListOptions::new();
    if let Some(name) = std::env::args().nth(1) {
        options = options.name(name);
    }

    let routes = match tsu_routes::list(&router, &controllers, &options) {
        Ok(routes) if routes.is_empty() => {
            eprintln!("Your application doesn't have any routes matching the given criteria.");
            return Ok(());
        }
        Ok(routes) => routes,
        Err(tsu_routes::Error::EmptyRegistry) => {
            eprintln!("Your application doesn't have any routes.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    println!("{}", RouteList::HEADERS.join(" | "));
    for route in &routes {
        println!("{}", route.columns().join(" | "));
    }
    Ok(())
}
