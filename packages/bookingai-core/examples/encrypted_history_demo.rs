//! # Encrypted History Demo
//!
//! Walks one user's chat history through device-key mode, a passphrase
//! upgrade, a locked reload and an unlocked reload.
//!
//! ## Run
//!
//! ```bash
//! cargo run --example encrypted_history_demo
//! ```

use std::sync::Arc;

use bookingai_core::{
    Assistant, ChatConfig, ConversationStore, Identity, KeyValueStore, MemoryStore,
    ScriptedPrompt, StaticIdentity,
};

fn print_slots(kv: &MemoryStore) {
    for key in kv.keys() {
        let value = kv.get(&key).ok().flatten().unwrap_or_default();
        let preview: String = value.chars().take(48).collect();
        println!("    {:<28} {}...", key, preview);
    }
    println!();
}

#[tokio::main]
async fn main() -> bookingai_core::Result<()> {
    println!("=== BookingAI Core: Encrypted Chat History Demo ===\n");

    let kv = Arc::new(MemoryStore::new());
    let identity = Arc::new(StaticIdentity(Identity::user("u1")));
    let assistant = Assistant::offline();

    // Step 1: Fresh conversation in device-key mode
    println!("Step 1: Starting a fresh conversation for user u1...");
    let prompt = Arc::new(
        ScriptedPrompt::new()
            .with_passphrase("ocean-view-suite")
            .with_passphrase("ocean-view-suite"),
    );
    let store = ConversationStore::new(kv.clone(), identity.clone(), prompt, ChatConfig::default());
    let chat = store.init().await?;
    println!("  Load outcome: {:?}", chat.load_outcome());

    for question in ["Find me a luxury hotel in Paris", "Anything for a ski trip?"] {
        let reply = chat.send(question, &assistant).await?;
        println!("  You:       {}", question);
        println!("  Assistant: {}", reply.content);
    }
    chat.flush().await?;
    println!("\n  Stored slots (device-key mode):");
    print_slots(&kv);

    // Step 2: Upgrade to a passphrase
    println!("Step 2: Securing history with a passphrase...");
    chat.secure_with_passphrase().await?;
    println!("  Mode: {:?}", chat.mode());
    println!("\n  Stored slots (passphrase mode, device key gone):");
    print_slots(&kv);
    store.teardown().await?;

    // Step 3: Reload and decline the prompt
    println!("Step 3: Reloading and cancelling the passphrase prompt...");
    let prompt = Arc::new(ScriptedPrompt::new().with_cancel());
    let store = ConversationStore::new(kv.clone(), identity.clone(), prompt, ChatConfig::default());
    let chat = store.init().await?;
    println!("  Load outcome: {:?}", chat.load_outcome());
    println!("  Visible messages: {}", chat.messages().len());
    store.teardown().await?;

    // Step 4: Reload with the right passphrase
    println!("\nStep 4: Reloading with the correct passphrase...");
    let prompt = Arc::new(ScriptedPrompt::new().with_passphrase("ocean-view-suite"));
    let store = ConversationStore::new(kv.clone(), identity, prompt, ChatConfig::default());
    let chat = store.init().await?;
    println!("  Load outcome: {:?}", chat.load_outcome());
    for message in chat.messages() {
        let preview: String = message.content.chars().take(60).collect();
        println!("  [{:?}] {}", message.role, preview);
    }
    store.teardown().await?;

    println!("\n=== Demo Complete ===");
    Ok(())
}
