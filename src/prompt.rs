use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Language answers are requested in unless configured otherwise
pub const DEFAULT_LANGUAGE: &str = "Vietnamese (Tiếng Việt)";

/// Stand-in for page text when extraction produced nothing
pub const NO_PAGE_CONTENT: &str = "(No page content available)";

/// What the user is asking the companion to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PromptType {
    /// Free-form question about the page
    Question,
    Summarize,
    ExtractLinks,
    ExtractContact,
    /// Translate the page; the question names the target language
    Translate,
    ReadingMode,
    #[value(alias = "choose")]
    HelpChooseProduct,
    #[value(alias = "advice")]
    PurchaseAdvice,
}

/// How the user content is assembled around the page text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContentRule {
    /// `Web page content:\n{page}\n\nQuestion: {q}`
    Question,
    /// Fixed instruction, then the page; the question is ignored
    Instruction(&'static str),
    /// `{q}\n\nContent to translate:\n{page}`
    Translate,
    /// Fixed instruction, optional `{label}: {q}\n\n`, then `Page content:\n\n{page}`
    Shopping {
        instruction: &'static str,
        context_label: &'static str,
    },
}

/// Static description of one prompt type
#[derive(Debug)]
pub struct PromptProfile {
    pub system_prompt: &'static str,
    rule: ContentRule,
    /// Extract the page with its harvested links
    pub wants_links: bool,
    /// Append the product catalog to the page text
    pub wants_catalog: bool,
    /// What the user "said" when the turn came from a button or slash command
    pub label: &'static str,
    /// Question used when the user leaves it blank
    pub default_question: Option<&'static str>,
}

static QUESTION: PromptProfile = PromptProfile {
    system_prompt: "You are a helpful assistant that answers questions about web page content. Provide concise and accurate answers based only on the provided page content. The content may include \"Products on page (title | URL | price):\" and an \"Additional links found on page\" section with lines of the form \"linkText: url\". When the user asks for the link or URL of a specific product (or the cheapest product, etc.), use those sections and return the full URL for that product, never only \"/\" or a relative path. Do not return the current page URL or a collection/category URL unless the user explicitly asked for that. When the user asks for any other link or URL, use the section to find and return the exact full URL.",
    rule: ContentRule::Question,
    wants_links: true,
    wants_catalog: true,
    label: "Question",
    default_question: None,
};

static SUMMARIZE: PromptProfile = PromptProfile {
    system_prompt: "You are a helpful assistant that summarizes web page content. Provide a clear, concise summary capturing the main points.",
    rule: ContentRule::Instruction("Summarize this web page content:\n\n"),
    wants_links: false,
    wants_catalog: false,
    label: "Summarize this page",
    default_question: None,
};

static EXTRACT_LINKS: PromptProfile = PromptProfile {
    system_prompt: "You are a helpful assistant that extracts URLs from web page content. List all valid URLs found, one per line.",
    rule: ContentRule::Instruction("Extract all URLs from this web page content. List each URL on a new line:\n\n"),
    wants_links: true,
    wants_catalog: false,
    label: "Extract all links",
    default_question: None,
};

static EXTRACT_CONTACT: PromptProfile = PromptProfile {
    system_prompt: "You are a helpful assistant that extracts contact information from web page content. Find and list all emails, phone numbers, and addresses.",
    rule: ContentRule::Instruction("Extract all contact information (emails, phones, addresses) from this web page content:\n\n"),
    wants_links: true,
    wants_catalog: false,
    label: "Contact information",
    default_question: None,
};

static TRANSLATE: PromptProfile = PromptProfile {
    system_prompt: "You are a helpful assistant that translates content to the specified language. Preserve the original meaning.",
    rule: ContentRule::Translate,
    wants_links: false,
    wants_catalog: false,
    label: "Translate this page",
    default_question: Some("Translate to English"),
};

static READING_MODE: PromptProfile = PromptProfile {
    system_prompt: "You are a helpful assistant that extracts clean, readable text from web page content. Remove all navigation, ads, and clutter. Return only the main article or content in a clean format.",
    rule: ContentRule::Instruction("Extract the main readable content from this web page. Remove all navigation, ads, sidebars, and clutter. Return clean text:\n\n"),
    wants_links: false,
    wants_catalog: false,
    label: "Reading mode",
    default_question: None,
};

static HELP_CHOOSE_PRODUCT: PromptProfile = PromptProfile {
    system_prompt: "You are a helpful shopping assistant. Based on the web page content (which may include a \"Products on page (title | URL | price):\" section and an \"Additional links found on page\" section with \"linkText: url\" lines), help the user choose the right product. Use product titles, URLs, and prices from these sections. Compare options clearly, consider their stated budget or priorities if given, and recommend the best fit with brief pros and cons. When mentioning a product, include its full URL from the page content so the user can click through (never return only a path like \"/\" or \"/product/1\"). Be concise and practical.",
    rule: ContentRule::Shopping {
        instruction: "Help the user choose the right product from this page. ",
        context_label: "User's priorities or context",
    },
    wants_links: true,
    wants_catalog: true,
    label: "Help me choose",
    default_question: Some("Compare options and recommend the best fit for a typical buyer."),
};

static PURCHASE_ADVICE: PromptProfile = PromptProfile {
    system_prompt: "You are a helpful, honest shopping advisor. Based on the page content (including \"Products on page (title | URL | price):\" and \"Additional links found on page\" with \"linkText: url\"), give smart purchase advice: highlight real value, genuine limited-time or stock cues if present, and how well items match the user's needs. Use the product list and full URLs from the content when referring to specific items (never return only \"/\" or a relative path). Gently nudge toward a confident decision when it makes sense, but never be pushy or invent fake urgency. If something is not a good fit, say so. Keep the tone helpful and trustworthy.",
    rule: ContentRule::Shopping {
        instruction: "Give smart purchase advice based on this page. ",
        context_label: "User's question or context",
    },
    wants_links: true,
    wants_catalog: true,
    label: "Purchase advice",
    default_question: Some("Give honest purchase advice: value, any real urgency, and whether this is a good buy."),
};

impl PromptType {
    pub const ALL: [PromptType; 8] = [
        PromptType::Question,
        PromptType::Summarize,
        PromptType::ExtractLinks,
        PromptType::ExtractContact,
        PromptType::Translate,
        PromptType::ReadingMode,
        PromptType::HelpChooseProduct,
        PromptType::PurchaseAdvice,
    ];

    pub fn profile(self) -> &'static PromptProfile {
        match self {
            PromptType::Question => &QUESTION,
            PromptType::Summarize => &SUMMARIZE,
            PromptType::ExtractLinks => &EXTRACT_LINKS,
            PromptType::ExtractContact => &EXTRACT_CONTACT,
            PromptType::Translate => &TRANSLATE,
            PromptType::ReadingMode => &READING_MODE,
            PromptType::HelpChooseProduct => &HELP_CHOOSE_PRODUCT,
            PromptType::PurchaseAdvice => &PURCHASE_ADVICE,
        }
    }

    pub fn wants_links(self) -> bool {
        self.profile().wants_links
    }

    pub fn wants_catalog(self) -> bool {
        self.profile().wants_catalog
    }

    pub fn label(self) -> &'static str {
        self.profile().label
    }

    /// `question` if non-blank, else this intent's default question (or empty)
    pub fn question_or_default(self, question: &str) -> String {
        if question.trim().is_empty() {
            self.profile().default_question.unwrap_or_default().to_string()
        } else {
            question.to_string()
        }
    }
}

/// The two messages sent to the chat endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedPrompt {
    pub system_prompt: String,
    pub user_content: String,
}

/// Compose a prompt asking for answers in [`DEFAULT_LANGUAGE`]
pub fn compose(page_text: &str, question: &str, intent: PromptType) -> ComposedPrompt {
    compose_in(DEFAULT_LANGUAGE, page_text, question, intent)
}

/// Compose a prompt asking for answers in `language`
pub fn compose_in(language: &str, page_text: &str, question: &str, intent: PromptType) -> ComposedPrompt {
    let profile = intent.profile();
    let system_prompt = format!("{} Always respond in {}.", profile.system_prompt, language);

    let user_content = if page_text.trim().is_empty() {
        format!("{}\n\n{}", question, NO_PAGE_CONTENT)
    } else {
        match profile.rule {
            ContentRule::Question => format!("Web page content:\n{}\n\nQuestion: {}", page_text, question),
            ContentRule::Instruction(instruction) => format!("{}{}", instruction, page_text),
            ContentRule::Translate => format!("{}\n\nContent to translate:\n{}", question, page_text),
            ContentRule::Shopping {
                instruction,
                context_label,
            } => {
                let context = if question.trim().is_empty() {
                    String::new()
                } else {
                    format!("{}: {}\n\n", context_label, question)
                };
                format!("{}{}Page content:\n\n{}", instruction, context, page_text)
            }
        }
    };

    ComposedPrompt {
        system_prompt,
        user_content,
    }
}
