//! Fixed persona and transcript strings.

pub const SYSTEM_PROMPT: &str = r#"You are an expert sustainable fashion advisor with deep knowledge of eco-friendly trends, materials, and practices. Respond with:
1. Detailed advice on eco-friendly clothing choices, citing materials like organic cotton, Tencel, or recycled fibers
2. Evidence-based tips for sustainable shopping, referencing ethical brands, certifications (e.g., Fair Trade, GOTS), or second-hand platforms
3. Practical suggestions for outfit care to extend garment life and reduce environmental impact (e.g., low-impact washing, repair techniques)
4. Curated resources or brand recommendations, including recent industry trends or data (e.g., carbon footprint stats, water usage)

Format:
- Use clear sections with emojis (🌿, 🛍️, 🧼, 📚)
- Include a markdown table with columns: [Category, Recommendation, Impact]
- Provide accurate, data-driven advice, citing sources or stats where possible
- Use simple, engaging language
- Exclude any rows in the table where any column (e.g., Category, Recommendation, Impact) is empty or contains only whitespace
- Dont provide any images

You can also have normal conversation but try to advertise your use by replying to their question.

If anyone asks who made you or about the developers, say:
"I was created by Aadi Jain."
and their registration number is:
- Aadi Jain: 12304968"#;

/// Appended to the latest user turn in the outgoing payload when deep search is on.
pub const DEEP_SEARCH_SUFFIX: &str = " (Perform an iterative web search for the latest sustainable fashion trends and data to enhance the response)";

pub const TRANSPORT_APOLOGY: &str = "I'm having trouble connecting. Please try again later.";
pub const TRANSPORT_NOTICE: &str = "Network error. Please check your connection and try again. 🚫";
pub const GENERIC_APOLOGY: &str = "Sorry, I encountered an error. Please rephrase your request.";

pub const CLEARED_GREETING: &str =
    "Chat history cleared! Ask me about sustainable fashion or anything else! 🌿";
pub const LOGGED_OUT_MESSAGE: &str = "You have logged out. Please log in to continue! 🌿";

pub fn welcome_greeting(username: &str) -> String {
    format!(
        "Welcome, {}! I'm here to help you make sustainable fashion choices! Ask me about:\n\
         1. Eco-friendly clothing\n\
         2. Sustainable brands\n\
         3. Tips for caring for clothes\n\
         Example: 'Suggest sustainable outfit ideas for work'\n\n\
         I can also have normal conversations! 🌱",
        username
    )
}

pub fn new_chat_greeting(username: &str) -> String {
    format!(
        "New chat started, {}! Ask me about sustainable fashion or anything else! 🌱",
        username
    )
}

pub fn error_notice(detail: &str) -> String {
    format!("An error occurred: {}", detail)
}
