//! Thin wrappers over public HTTP APIs.

use super::{say, warn};
use crate::command::{BoundCall, CommandDescriptor, ContextKind, Guard, Param};
use crate::Data;
use anyhow::Context;
use reqwest::StatusCode;
use serde::Deserialize;
use std::sync::Arc;

const JOKE_URL: &str = "https://official-joke-api.appspot.com/random_joke";
const GITHUB_USERS_URL: &str = "https://api.github.com/users";
const WEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
const USER_AGENT: &str = concat!("turbo/", env!("CARGO_PKG_VERSION"));

pub fn descriptors() -> Vec<CommandDescriptor> {
    vec![
        CommandDescriptor::new("joke", "Tell a random joke", handler!(joke))
            .context(ContextKind::Message),
        CommandDescriptor::new("github", "Show a GitHub profile", handler!(github))
            .context(ContextKind::Message)
            .param(Param::required("user"))
            .guard(Guard::ApiKey("github")),
        CommandDescriptor::new("weather", "Current weather for a place", handler!(weather))
            .context(ContextKind::Message)
            .param(Param::required("location"))
            .context(ContextKind::LeftoverArgs)
            .guard(Guard::ApiKey("weather")),
    ]
}

#[derive(Debug, Deserialize)]
struct Joke {
    setup: String,
    punchline: String,
}

fn format_joke(joke: &Joke) -> String {
    format!(":laughing: {}\n||{}||", joke.setup, joke.punchline)
}

async fn joke(data: Arc<Data>, call: BoundCall) -> anyhow::Result<()> {
    let joke: Joke = data
        .http_client
        .get(JOKE_URL)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await
        .context("Failed parsing joke")?;
    say(&data, &call, &format_joke(&joke)).await;
    Ok(())
}

#[derive(Debug, Deserialize)]
struct GithubUser {
    login: String,
    name: Option<String>,
    bio: Option<String>,
    public_repos: u64,
    followers: u64,
    following: u64,
    html_url: String,
}

fn format_github(user: &GithubUser) -> String {
    let mut text = match &user.name {
        Some(name) => format!(":octopus: **{}** ({})", name, user.login),
        None => format!(":octopus: **{}**", user.login),
    };
    if let Some(bio) = user.bio.as_deref().filter(|bio| !bio.trim().is_empty()) {
        text.push_str(&format!("\n{}", bio.trim()));
    }
    text.push_str(&format!(
        "\nRepos: {} | Followers: {} | Following: {}\n<{}>",
        user.public_repos, user.followers, user.following, user.html_url
    ));
    text
}

async fn github(data: Arc<Data>, call: BoundCall) -> anyhow::Result<()> {
    let login = call.arg_or("user", "");
    let token = data.config.api_key("github").unwrap_or_default();
    let response = data
        .http_client
        .get(format!("{}/{}", GITHUB_USERS_URL, login))
        .header(reqwest::header::USER_AGENT, USER_AGENT)
        .bearer_auth(token)
        .send()
        .await?;
    if response.status() == StatusCode::NOT_FOUND {
        warn(&data, &call, &format!("No GitHub user **{}**", login)).await;
        return Ok(());
    }
    let user: GithubUser = response
        .error_for_status()?
        .json()
        .await
        .context("Failed parsing GitHub user")?;
    say(&data, &call, &format_github(&user)).await;
    Ok(())
}

#[derive(Debug, Deserialize)]
struct WeatherReport {
    name: String,
    weather: Vec<WeatherCondition>,
    main: WeatherMain,
    wind: Option<Wind>,
}

#[derive(Debug, Deserialize)]
struct WeatherCondition {
    description: String,
}

#[derive(Debug, Deserialize)]
struct WeatherMain {
    temp: f64,
    feels_like: f64,
    humidity: u64,
}

#[derive(Debug, Deserialize)]
struct Wind {
    speed: f64,
}

fn format_weather(report: &WeatherReport) -> String {
    let conditions = report
        .weather
        .iter()
        .map(|w| w.description.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let mut text = format!(
        ":partly_sunny: **{}**: {:.1}°C (feels like {:.1}°C), humidity {}%",
        report.name, report.main.temp, report.main.feels_like, report.main.humidity
    );
    if !conditions.is_empty() {
        text.push_str(&format!(", {}", conditions));
    }
    if let Some(wind) = &report.wind {
        text.push_str(&format!(", wind {:.1} m/s", wind.speed));
    }
    text
}

async fn weather(data: Arc<Data>, call: BoundCall) -> anyhow::Result<()> {
    let location = call.rest_of("location");
    let key = data.config.api_key("weather").unwrap_or_default();
    let response = data
        .http_client
        .get(WEATHER_URL)
        .query(&[("q", location.as_str()), ("appid", key), ("units", "metric")])
        .send()
        .await?;
    if response.status() == StatusCode::NOT_FOUND {
        warn(&data, &call, &format!("No weather found for **{}**", location)).await;
        return Ok(());
    }
    let report: WeatherReport = response
        .error_for_status()?
        .json()
        .await
        .context("Failed parsing weather report")?;
    say(&data, &call, &format_weather(&report)).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::dispatch::handle;
    use crate::testing::{harness, message, SELF_ID};

    #[test]
    fn test_format_joke() {
        let joke: Joke = serde_json::from_str(
            r#"{"id": 1, "type": "general", "setup": "Why?", "punchline": "Because."}"#,
        )
        .unwrap();
        assert_eq!(format_joke(&joke), ":laughing: Why?\n||Because.||");
    }

    #[test]
    fn test_format_github() {
        let user: GithubUser = serde_json::from_str(
            r#"{
                "login": "octocat",
                "name": "The Octocat",
                "bio": null,
                "public_repos": 8,
                "followers": 100,
                "following": 9,
                "html_url": "https://github.com/octocat"
            }"#,
        )
        .unwrap();
        assert_eq!(
            format_github(&user),
            ":octopus: **The Octocat** (octocat)\nRepos: 8 | Followers: 100 | Following: 9\n<https://github.com/octocat>"
        );
    }

    #[test]
    fn test_format_weather() {
        let report: WeatherReport = serde_json::from_str(
            r#"{
                "name": "Oslo",
                "weather": [{"main": "Clouds", "description": "broken clouds"}],
                "main": {"temp": 3.456, "feels_like": -0.04, "humidity": 81},
                "wind": {"speed": 4.1}
            }"#,
        )
        .unwrap();
        assert_eq!(
            format_weather(&report),
            ":partly_sunny: **Oslo**: 3.5°C (feels like -0.0°C), humidity 81%, broken clouds, wind 4.1 m/s"
        );
    }

    #[tokio::test]
    async fn test_missing_key_blocks_request() {
        let h = harness(Config::default());
        assert!(handle(&h.data, message(SELF_ID, "$github octocat"))
            .await
            .is_none());
        assert_eq!(
            h.transport.texts(),
            vec![":warning: This command requires an API key for **github**".to_string()]
        );
    }
}
