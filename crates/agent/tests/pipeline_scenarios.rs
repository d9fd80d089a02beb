//! End-to-end text pipeline scenarios against scripted model and index

mod common;

use std::sync::Arc;

use common::{project, project_with_images, Reply, ScriptedBackend, StaticRetriever};
use realty_agent_agent::{AgentError, ChatSession, RealtyAgent, Responder};
use realty_agent_core::{ConversationTurn, Language, ResponseMode};

#[tokio::test]
async fn test_villas_in_goa_without_images() {
    let backend = ScriptedBackend::new(
        "English",
        Reply::Fixed(
            r#"{"answer": "Palm Grove and Sea Breeze both offer 3BHK villas in North Goa.", "image_urls": []}"#
                .to_string(),
        ),
    );
    let retriever = StaticRetriever::new(vec![
        project("Palm Grove: 3BHK villas in Assagao, Goa"),
        project("Sea Breeze: 3BHK villas in Candolim, Goa"),
    ]);
    let agent = RealtyAgent::new(backend.clone(), retriever.clone(), 15);

    let history = vec![ConversationTurn::user("Show me 3BHK villas in Goa")];
    let result = agent
        .generate_response(&history, ResponseMode::Text)
        .await
        .unwrap();

    assert!(result.image_urls.is_empty());
    assert!(!result.text.is_empty());
    assert!(Language::ALL.contains(&result.language));

    let queries = retriever.queries.lock().clone();
    assert_eq!(queries, vec![("Show me 3BHK villas in Goa".to_string(), 15)]);

    let prompt = &backend.prompts()[0];
    assert!(prompt.contains("Palm Grove: 3BHK villas in Assagao, Goa\nSea Breeze"));
    assert!(prompt.contains("No image data available"));
}

#[tokio::test]
async fn test_hinglish_query_gets_hindi_register() {
    let backend = ScriptedBackend::new(
        "Hindi",
        Reply::Fixed(r#"{"answer": "Yeh property bahut achhi hai.", "image_urls": []}"#.to_string()),
    );
    let agent = RealtyAgent::new(backend.clone(), StaticRetriever::new(vec![]), 15);

    let history = vec![ConversationTurn::user("Yeh property kaisi hai?")];
    let result = agent
        .generate_response(&history, ResponseMode::Text)
        .await
        .unwrap();

    assert_eq!(result.language, Language::Hindi);
    let prompt = &backend.prompts()[0];
    assert!(prompt.contains("Hinglish"));
    assert!(prompt.contains("(hi)"));
}

#[tokio::test]
async fn test_unknown_language_label_defaults_to_hindi() {
    let backend = ScriptedBackend::new("French", Reply::Echo);
    let agent = RealtyAgent::new(backend, StaticRetriever::new(vec![]), 15);

    let result = agent
        .generate_response(&[ConversationTurn::user("Bonjour")], ResponseMode::Text)
        .await
        .unwrap();
    assert_eq!(result.language, Language::Hindi);
}

#[tokio::test]
async fn test_reply_wrapped_in_chatter_is_extracted() {
    let backend = ScriptedBackend::new(
        "English",
        Reply::Fixed(
            r#"Sure! {"answer": "It has a pool.", "image_urls": ["http://x/1.jpg"]} Hope that helps."#
                .to_string(),
        ),
    );
    let retriever = StaticRetriever::new(vec![project_with_images(
        "Lake View Towers, Powai",
        &[("pool", "http://x/1.jpg")],
    )]);
    let agent = RealtyAgent::new(backend.clone(), retriever, 15);

    let history = vec![ConversationTurn::user("Does Lake View have a pool?")];
    let result = agent
        .generate_response(&history, ResponseMode::Text)
        .await
        .unwrap();

    assert_eq!(result.text, "It has a pool.");
    assert_eq!(result.image_urls, vec!["http://x/1.jpg".to_string()]);
    assert!(backend.prompts()[0].contains("- pool: http://x/1.jpg"));
}

#[tokio::test]
async fn test_unstructured_reply_falls_back_to_raw_text() {
    let backend = ScriptedBackend::new(
        "English",
        Reply::Fixed("  Sorry, I could not find that project.  ".to_string()),
    );
    let agent = RealtyAgent::new(backend, StaticRetriever::new(vec![]), 15);

    let result = agent
        .generate_response(&[ConversationTurn::user("Any plots?")], ResponseMode::Text)
        .await
        .unwrap();
    assert_eq!(result.text, "Sorry, I could not find that project.");
    assert!(result.image_urls.is_empty());
}

#[tokio::test]
async fn test_shared_images_listed_once() {
    let backend = ScriptedBackend::new("English", Reply::Echo);
    let retriever = StaticRetriever::new(vec![
        project_with_images("Tower A", &[("lobby", "http://cdn/lobby.jpg")]),
        project_with_images(
            "Tower B",
            &[("lobby", "http://cdn/lobby.jpg"), ("gym", "http://cdn/gym.jpg")],
        ),
    ]);
    let agent = RealtyAgent::new(backend.clone(), retriever, 15);

    agent
        .generate_response(&[ConversationTurn::user("Amenities?")], ResponseMode::Text)
        .await
        .unwrap();

    let prompt = &backend.prompts()[0];
    assert_eq!(prompt.matches("- lobby: http://cdn/lobby.jpg").count(), 1);
    assert_eq!(prompt.matches("- gym: http://cdn/gym.jpg").count(), 1);
}

#[tokio::test]
async fn test_voice_mode_adds_spoken_directive() {
    let backend = ScriptedBackend::new("English", Reply::Echo);
    let agent = RealtyAgent::new(backend.clone(), StaticRetriever::new(vec![]), 15);
    let history = [ConversationTurn::user("Price of Sea Crest?")];

    agent.respond(&history, ResponseMode::Text).await.unwrap();
    agent.respond(&history, ResponseMode::Voice).await.unwrap();

    let prompts = backend.prompts();
    assert!(!prompts[0].contains("about 40 words"));
    assert!(prompts[1].contains("about 40 words"));
}

#[tokio::test]
async fn test_history_is_sent_as_prior_messages() {
    let backend = ScriptedBackend::new("English", Reply::Echo);
    let agent: Arc<dyn Responder> =
        Arc::new(RealtyAgent::new(backend.clone(), StaticRetriever::new(vec![]), 15));
    let session = ChatSession::new("history", agent, 40);

    session.ask("Hi", ResponseMode::Text).await.unwrap();
    let second = session.ask("Anything in Bandra?", ResponseMode::Text).await.unwrap();
    assert_eq!(second.text, "Reply to Anything in Bandra?");

    let main_calls: Vec<_> = backend
        .calls()
        .into_iter()
        .filter(|messages| messages.len() > 1)
        .collect();
    let last = main_calls.last().unwrap();
    // user, assistant, user, then the composed prompt
    assert_eq!(last.len(), 4);
    assert_eq!(last[0].content, "Hi");
    assert_eq!(last[1].content, "Reply to Hi");
    assert!(last[3].content.contains("User: Hi\nAssistant: Reply to Hi\nUser: Anything in Bandra?"));
}

#[tokio::test]
async fn test_model_failure_propagates() {
    let backend = ScriptedBackend::new("English", Reply::Fail);
    let agent = RealtyAgent::new(backend, StaticRetriever::new(vec![]), 15);

    let err = agent
        .generate_response(&[ConversationTurn::user("Hello")], ResponseMode::Text)
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::Llm(_)));
    assert!(err.is_upstream());
}
