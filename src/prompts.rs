//! Prompt template for article annotation.
//!
//! The template asks the model for a formal abstract in Russian, phrased with
//! the stock openings of academic abstracts and without any interpretation
//! beyond the article itself. Callers can override it via
//! [`crate::config::AnnotationConfig::prompt_template`]; the constant here is
//! used only when no override is provided.

/// Placeholder replaced by the cleaned article text.
pub const TEXT_PLACEHOLDER: &str = "{text}";

/// Default prompt template. `{text}` is replaced by the cleaned article.
pub const PROMPT_TEMPLATE: &str = r#"
# Задача: Создание аннотации научной статьи

Напишите аннотацию к научной статье на **РУССКОМ языке**, отражающую ключевые аспекты исследования. Аннотация должна быть лаконичной, содержательной и соответствовать стилю научного изложения. **Не включайте заголовок "Аннотация".**

## Требования
- Используйте следующие речевые шаблоны:
  - «В статье исследуется, анализируется, рассматривается…»;
  - «Статья дает анализ…, подробно освещает…»;
  - «В работе дан анализ (...), раскрыты понятия (...), предложены (...)»;
  - «Статья посвящена…»;
  - «Автор статьи предполагает, характеризует...»;
  - «Используя (...), автор в своих исследованиях доказывает (...)»;
  - «В статье раскрывается, описывается, уделяется внимание…».
- **Не добавляйте личных интерпретаций**, гипотез или выводов, не содержащихся в оригинальном тексте статьи.
- Сохраняйте формальную, нейтральную и научную тональность.

## Входные данные
**Текст статьи:**
"{text}"

## Выходные данные
Только текст аннотации. 
"#;

/// Fill the default template with `text`.
pub fn build_prompt(text: &str) -> String {
    build_prompt_with(PROMPT_TEMPLATE, text)
}

/// Fill `template` with `text`.
///
/// Every `{text}` occurrence is substituted in a single pass, so braces or a
/// literal `{text}` inside the article itself are left untouched.
pub fn build_prompt_with(template: &str, text: &str) -> String {
    template.replace(TEXT_PLACEHOLDER, text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_template_has_single_placeholder() {
        assert_eq!(PROMPT_TEMPLATE.matches(TEXT_PLACEHOLDER).count(), 1);
    }

    #[test]
    fn build_prompt_embeds_text_in_quotes() {
        let prompt = build_prompt("Статья о грибах.");
        assert!(prompt.contains("\"Статья о грибах.\""));
        assert!(!prompt.contains(TEXT_PLACEHOLDER));
        assert!(prompt.contains("Только текст аннотации."));
    }

    #[test]
    fn default_template_keeps_its_exact_ending() {
        assert!(PROMPT_TEMPLATE.starts_with("\n# Задача: Создание аннотации научной статьи\n"));
        assert!(PROMPT_TEMPLATE.ends_with("## Выходные данные\nТолько текст аннотации. \n"));
    }

    #[test]
    fn article_braces_are_not_reinterpreted() {
        let prompt = build_prompt_with("<<{text}>>", "set {x} and {text}");
        assert_eq!(prompt, "<<set {x} and {text}>>");
    }
}
