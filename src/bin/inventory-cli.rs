use std::fs;

use clap::{Parser, Subcommand, ValueEnum};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};

const TOKEN_FILE: &str = ".inventory_token";

#[derive(Parser)]
#[command(name = "inventory-cli")]
#[command(about = "CLI for the inventory admin API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, env = "INVENTORY_URL", default_value = "http://localhost:3000")]
    url: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum Resource {
    Products,
    Employees,
    Suppliers,
}

impl Resource {
    fn path(self) -> &'static str {
        match self {
            Resource::Products => "/api/products",
            Resource::Employees => "/api/employees",
            Resource::Suppliers => "/api/suppliers",
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    Register {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
        #[arg(short, long)]
        email: Option<String>,
        #[arg(short, long)]
        role: Option<String>,
    },
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
    },
    /// Profile for the saved login token
    Me,
    Users,
    /// List documents; filters are query parameters such as `category=tops`
    List {
        resource: Resource,
        #[arg(short, long = "filter", value_parser = parse_filter)]
        filters: Vec<(String, String)>,
    },
    Get {
        resource: Resource,
        id: String,
    },
    Create {
        resource: Resource,
        /// JSON document body
        #[arg(short, long)]
        data: String,
    },
    Update {
        resource: Resource,
        id: String,
        /// JSON object with the fields to change
        #[arg(short, long)]
        data: String,
    },
    Delete {
        resource: Resource,
        id: String,
    },
    Logout,
}

#[derive(Deserialize)]
struct LoginResponse {
    username: String,
    role: String,
    token: String,
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got `{raw}`"))
}

fn parse_body(data: &str) -> Result<Value, Box<dyn std::error::Error>> {
    Ok(serde_json::from_str(data)?)
}

async fn print_response(res: Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    let pretty = serde_json::from_str::<Value>(&text)
        .and_then(|v| serde_json::to_string_pretty(&v))
        .unwrap_or(text);
    println!("{status}\n{pretty}");
    Ok(())
}

fn with_token(req: RequestBuilder) -> RequestBuilder {
    match fs::read_to_string(TOKEN_FILE) {
        Ok(token) => req.bearer_auth(token.trim()),
        Err(_) => req,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Register { username, password, email, role } => {
            let res = client
                .post(format!("{base}/api/auth/register"))
                .json(&json!({ "username": username, "password": password, "email": email, "role": role }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Login { username, password } => {
            let res = client
                .post(format!("{base}/api/auth/login"))
                .json(&json!({ "username": username, "password": password }))
                .send()
                .await?;
            if res.status().is_success() {
                let body: LoginResponse = res.json().await?;
                fs::write(TOKEN_FILE, body.token)?;
                println!("Logged in as {} ({}). Token saved to {TOKEN_FILE}", body.username, body.role);
            } else {
                print_response(res).await?;
            }
        }
        Commands::Me => {
            let res = with_token(client.get(format!("{base}/api/auth/me"))).send().await?;
            print_response(res).await?;
        }
        Commands::Users => {
            let res = client.get(format!("{base}/api/auth/users")).send().await?;
            print_response(res).await?;
        }
        Commands::List { resource, filters } => {
            let res = client
                .get(format!("{base}{}", resource.path()))
                .query(&filters)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Get { resource, id } => {
            let res = client.get(format!("{base}{}/{id}", resource.path())).send().await?;
            print_response(res).await?;
        }
        Commands::Create { resource, data } => {
            let res = client
                .post(format!("{base}{}", resource.path()))
                .json(&parse_body(&data)?)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Update { resource, id, data } => {
            let res = client
                .put(format!("{base}{}/{id}", resource.path()))
                .json(&parse_body(&data)?)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Delete { resource, id } => {
            let res = client.delete(format!("{base}{}/{id}", resource.path())).send().await?;
            print_response(res).await?;
        }
        Commands::Logout => {
            let _ = fs::remove_file(TOKEN_FILE);
            println!("Logged out (token removed).");
        }
    }

    Ok(())
}
