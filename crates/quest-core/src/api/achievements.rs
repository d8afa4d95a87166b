//! Achievement endpoints (read-only)

use reqwest::Method;

use super::ApiClient;
use crate::types::{Achievement, Result};

impl ApiClient {
    /// `GET /achievements`
    pub async fn list_achievements(&self) -> Result<Vec<Achievement>> {
        let request = self.request(Method::GET, "/achievements");
        self.send_json(request, "list achievements").await
    }

    /// `GET /achievements/user/{userId}`
    pub async fn list_user_achievements(&self, user_id: i64) -> Result<Vec<Achievement>> {
        let request = self.request(Method::GET, &format!("/achievements/user/{}", user_id));
        self.send_json(request, "list user achievements").await
    }
}

#[cfg(test)]
mod tests {
    use super::super::client::test_server::serve_once;
    use super::*;

    #[tokio::test]
    async fn test_user_achievements_decode_type_field() {
        let (base, server) = serve_once(
            200,
            r#"[{"id":1,"name":"First Blood","isAchieved":true,"type":"tasks"},{"id":2,"name":"Scholar","requiredXp":500}]"#,
        )
        .await;
        let client = ApiClient::new(&base);

        let achievements = client.list_user_achievements(4).await.unwrap();
        assert_eq!(achievements[0].kind.as_deref(), Some("tasks"));
        assert!(achievements[0].achieved());
        assert!(!achievements[1].achieved());
        assert_eq!(achievements[1].required_xp, Some(500));

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /achievements/user/4 HTTP/1.1"));
    }
}
