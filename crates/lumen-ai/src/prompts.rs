//! Prompt construction for the four-sages journal features. Every prompt is
//! bilingual; Chinese is the default when the client sends no language tag.

use lumen_types::models::ReviewKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    En,
    Zh,
}

impl Language {
    /// Maps a client language tag; anything that is not `en` is Chinese.
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag {
            Some("en") => Language::En,
            _ => Language::Zh,
        }
    }
}

pub fn wisdom_system(language: Language) -> &'static str {
    match language {
        Language::En => {
            "You generate inspirational messages from four sages: Messenger of Love (✨), \
             Awakened One (🪷), Lao Tzu (☯️), and Plato (🏛️).\n\
             Messenger of Love speaks with unconditional warmth and natural metaphors and \
             addresses the reader as \"child\". Awakened One points directly at awareness and \
             the present moment. Lao Tzu writes as a nature poet in Taoist paradox. Plato asks \
             after essence and truth in the Socratic manner.\n\
             Return a JSON array of exactly 4 objects, one per sage:\n\
             [{\"sage\": \"Messenger of Love\", \"emoji\": \"✨\", \"message\": \"...\"}, ...]"
        }
        Language::Zh => {
            "你为四位智者生成启示：爱之使者(✨)、觉者(🪷)、老子(☯️)、柏拉图(🏛️)。\n\
             爱之使者以无条件的爱与自然比喻说话，称呼读者为“孩子”；觉者直指觉知与当下；\
             老子以自然意象和道家辩证写作；柏拉图以苏格拉底式的追问探究本质与真理。\n\
             返回恰好包含4个对象的JSON数组，每位智者一个：\n\
             [{\"sage\": \"爱之使者\", \"emoji\": \"✨\", \"message\": \"...\"}, ...]"
        }
    }
}

pub fn wisdom_user(topic: &str, content: &str, language: Language) -> String {
    match language {
        Language::En => format!(
            "The user is writing about: \"{topic}\"\n\n\
             Their current content: \"{content}\"\n\n\
             For each sage, give one message that offers an elevated insight, ends with a \
             single thought-provoking question, and is personal to what they wrote.\n\
             Return ONLY a valid JSON array."
        ),
        Language::Zh => format!(
            "用户正在写关于：“{topic}”\n\n\
             当前内容：“{content}”\n\n\
             为每位智者生成一条启示：先给出高维洞见，再以一个引发思考的问题结尾，\
             并与用户写下的内容紧密相关。\n\
             只返回有效的JSON数组。"
        ),
    }
}

pub fn summary_system(language: Language) -> &'static str {
    match language {
        Language::En => {
            "You generate concluding wisdom from four sages for a completed journal entry: \
             Messenger of Love (✨), Awakened One (🪷), Lao Tzu (☯️), Plato (🏛️). Each sage \
             acknowledges the entry and closes with a blessing, not a question.\n\
             Return a JSON array of exactly 4 objects."
        }
        Language::Zh => {
            "你为完成的日记生成四位智者的总结智慧：爱之使者(✨)、觉者(🪷)、老子(☯️)、\
             柏拉图(🏛️)。每位智者认可这篇日记，并以祝福而非问题结尾。\n\
             返回恰好包含4个对象的JSON数组。"
        }
    }
}

pub fn summary_user(topic: &str, content: &str, language: Language) -> String {
    match language {
        Language::En => format!(
            "The user wrote about: \"{topic}\"\n\n\
             Their entry: \"{content}\"\n\n\
             For each sage, acknowledge what they wrote, offer an elevated insight, and end \
             with a blessing (NOT a question).\n\
             Return ONLY a valid JSON array."
        ),
        Language::Zh => format!(
            "用户写了关于：“{topic}”\n\n\
             日记内容：“{content}”\n\n\
             为每位智者生成总结：认可所写内容，提供高维洞见，并以祝福（而非问题）结尾。\n\
             只返回有效的JSON数组。"
        ),
    }
}

pub fn topics_system(language: Language) -> &'static str {
    match language {
        Language::En => {
            "You generate personalized journal prompts from the user's recent entries: deep, \
             specific questions that help them explore their inner world.\n\
             Return a JSON array of exactly 5 topic strings."
        }
        Language::Zh => {
            "你根据用户最近的日记生成个性化写作题目：深刻、具体、帮助探索内心世界的问题。\n\
             返回恰好包含5个题目字符串的JSON数组。"
        }
    }
}

pub fn topics_user(recent_entries: &[String], language: Language) -> String {
    let entries_text = recent_entries.join("\n---\n");
    match language {
        Language::En => format!(
            "Based on these recent journal entries:\n\n{entries_text}\n\n\
             Generate 5 personalized questions that build on their themes, invite deeper \
             self-reflection, and are specific rather than generic.\n\
             Return ONLY a valid JSON array of 5 strings."
        ),
        Language::Zh => format!(
            "基于这些最近的日记：\n\n{entries_text}\n\n\
             生成5个个性化的深度问题：延续写作中的主题，鼓励更深的自我反思，具体而非泛泛。\n\
             只返回包含5个字符串的有效JSON数组。"
        ),
    }
}

pub fn review_system(kind: ReviewKind, language: Language) -> &'static str {
    match (kind, language) {
        (ReviewKind::Consciousness, Language::En) => {
            "You analyze journal entries against David Hawkins' Map of Consciousness: identify \
             patterns and growth and describe the writer's inner evolution."
        }
        (ReviewKind::Consciousness, Language::Zh) => {
            "你基于大卫·霍金斯的意识地图分析日记：识别模式与成长，描述作者的内在演进。"
        }
        (ReviewKind::Growth, Language::En) => {
            "You analyze journal entries for personal growth: themes of learning, overcoming \
             challenges, and development over time."
        }
        (ReviewKind::Growth, Language::Zh) => {
            "你分析日记中的个人成长：学习、克服挑战与随时间发展的主题。"
        }
        (ReviewKind::Relationships, Language::En) => {
            "You analyze journal entries for relationship patterns: the people mentioned, the \
             gratitude expressed, and the dynamics between them."
        }
        (ReviewKind::Relationships, Language::Zh) => {
            "你分析日记中的人际关系模式：提到的人物、表达的感恩以及其中的关系动态。"
        }
        (ReviewKind::Attention, Language::En) => {
            "You read journal entries with unconditional warmth and suggest, gently, the areas \
             that deserve the writer's attention and care."
        }
        (ReviewKind::Attention, Language::Zh) => {
            "你以无条件的爱阅读日记，温和地指出值得作者关注与照料的方面。"
        }
    }
}

pub fn review_user(kind: ReviewKind, entries: &[String], language: Language) -> String {
    let mut entries_text = String::new();
    for (i, entry) in entries.iter().enumerate() {
        entries_text.push_str(&format!("\n--- Entry {} ---\n{}", i + 1, entry));
    }

    match language {
        Language::En => format!(
            "Analyze these journal entries for {}:\n{entries_text}\n\n\
             Provide a comprehensive analysis with specific examples from the entries.",
            kind.as_str()
        ),
        Language::Zh => {
            let label = match kind {
                ReviewKind::Consciousness => "意识层级",
                ReviewKind::Growth => "成长轨迹",
                ReviewKind::Relationships => "人际关系",
                ReviewKind::Attention => "需要关注的方面",
            };
            format!("分析这些日记的{label}：\n{entries_text}\n\n提供全面的分析，包含日记中的具体例子。")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tags_default_to_chinese() {
        assert_eq!(Language::from_tag(None), Language::Zh);
        assert_eq!(Language::from_tag(Some("fr")), Language::Zh);
        assert_eq!(Language::from_tag(Some("en")), Language::En);
    }

    #[test]
    fn prompts_embed_user_content() {
        let prompt = wisdom_user("an old friend", "we spoke again today", Language::En);
        assert!(prompt.contains("an old friend"));
        assert!(prompt.contains("we spoke again today"));
    }
}
