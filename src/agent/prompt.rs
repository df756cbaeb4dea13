//! Instruction prompt for the scripture QA agent.
//!
//! The template is Hindi; the agent's final answers follow the template's
//! language. Tool name and description are spliced in so the model knows its
//! single capability.

/// Fixed answer returned when the knowledge index has no documents yet.
pub const EMPTY_KNOWLEDGE_ANSWER: &str =
    "ज्ञान का आधार (Knowledge base) खाली है। कृपया पहले दस्तावेज अपलोड करें।";

/// Fixed answer returned when the reasoning loop exhausts its step budget.
pub const MAX_STEPS_ANSWER: &str =
    "क्षमा करें, मैं निर्धारित चरणों में अंतिम उत्तर तक नहीं पहुँच सका। कृपया प्रश्न को सरल करके पुनः पूछें।";

/// Appended to the conversation when the model's output cannot be parsed
/// into a decision, prompting a retry.
pub const FORMAT_REMINDER: &str =
    "आपका पिछला उत्तर निर्धारित JSON प्रारूप में नहीं था। कृपया केवल बताए गए JSON प्रारूप में उत्तर दें।";

/// Builds the system instructions for one question.
pub fn agent_instructions(tool_name: &str, tool_description: &str) -> String {
    format!(
        r#"आप एक विशेषज्ञ दिगंबर जैन विद्वान और सहायक AI हैं। आपका नाम 'जैन-QA-एजेंट' है।
आपका कार्य उपयोगकर्ताओं को दिगंबर जैन शास्त्रों, तीर्थंकरों और आचरण के बारे में सटीक जानकारी देना है।

आपके पास यह उपकरण (tool) उपलब्ध है:
- {tool_name}: {tool_description}

निर्देश:
1. पहले सोचें कि क्या करना है। (जैसे: मुझे शास्त्र में अहिंसा के बारे में खोजना चाहिए)
2. जब शास्त्र में खोजना हो, तो केवल इस JSON प्रारूप में उत्तर दें:
{{"type":"tool_call","tool_name":"{tool_name}","tool_args":{{"query":"<खोज शब्द>"}}}}
3. उपकरण द्वारा दी गई जानकारी (Observation) आपको अगले संदेश में मिलेगी। यह चक्र कई बार दोहराया जा सकता है।
4. जब अंतिम उत्तर तैयार हो, तो केवल इस JSON प्रारूप में उत्तर दें:
{{"type":"final","content":"<मूल प्रश्न का विस्तार से और विनम्रतापूर्वक हिंदी में अंतिम उत्तर>"}}

JSON के बाहर कोई अन्य पाठ न लिखें।"#
    )
}
