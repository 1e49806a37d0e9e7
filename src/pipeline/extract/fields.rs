//! Built-in field tables. Markers cover the Portuguese the personas are
//! prompted in plus English equivalents.

use super::FieldSpec;

pub const IMMEDIATE_ACTION: &str = "immediate_action";
pub const INVESTMENT: &str = "investment";
pub const FIRST_WEEK_PLAN: &str = "first_week_plan";
pub const BEST_IDEA: &str = "best_idea";
pub const FIRST_IDEA: &str = "first_idea";

pub const BEST_IDEA_DEFAULT: &str = "Main niche channel";

/// The three summary cards read from the CEO verdict.
pub fn ceo_action_plan() -> Vec<FieldSpec> {
    vec![
        FieldSpec::new(IMMEDIATE_ACTION, "See the full report above for details.")
            .starts(&[
                "ação concreta para hoje",
                "ação imediata",
                "concrete action for today",
                "immediate action",
            ])
            .or_starts(&[
                "próximo passo:",
                "passo imediato",
                "next step:",
                "next immediate step",
                "immediate next step",
            ])
            .ends(&["investimento", "custos", "investment", "costs"])
            .max_chars(250),
        FieldSpec::new(INVESTMENT, "Variable.")
            .starts(&[
                "investimento inicial",
                "investimento",
                "initial investment",
                "investment",
            ])
            .ends(&["primeira semana", "semana 1", "first week", "week 1"])
            .max_chars(200),
        FieldSpec::new(FIRST_WEEK_PLAN, "Follow the schedule.")
            .starts(&["primeira semana", "semana 1", "first week", "week 1"])
            .ends(&["✅", "decisão final", "final decision"])
            .max_chars(300),
    ]
}

/// Heading of the Hunter's first channel idea plus up to three detail lines.
pub fn best_idea() -> FieldSpec {
    FieldSpec::new(BEST_IDEA, BEST_IDEA_DEFAULT)
        .starts(&["### ideia 1", "ideia 1", "primeira ideia", "idea 1", "first idea"])
        .ends(&["ideia 2", "idea 2"])
        .capture_lines(3)
        .max_chars(300)
        .with_marker_line()
}

/// Just the line naming the first idea.
pub fn first_idea() -> FieldSpec {
    FieldSpec::new(FIRST_IDEA, "Main idea")
        .starts(&["ideia 1", "idea 1", "primeira", "first", "###"])
        .capture_lines(0)
        .max_chars(100)
        .with_marker_line()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::blocks::normalize;
    use crate::pipeline::extract::extract;

    const CEO: &str = "## 🚀 PRÓXIMO PASSO IMEDIATO
- **Ação concreta para hoje:** Gravar o primeiro vídeo
- **Investimento inicial:** R$ 300 em ferramentas
- **Primeira semana:** Publicar 3 vídeos

## ✅ DECISÃO FINAL
- Aprovação: SIM";

    #[test]
    fn ceo_cards() {
        let fields = extract(&normalize(CEO), &ceo_action_plan());
        assert_eq!(fields.get(IMMEDIATE_ACTION), Some("Gravar o primeiro vídeo"));
        assert_eq!(fields.get(INVESTMENT), Some("R$ 300 em ferramentas"));
        assert_eq!(fields.get(FIRST_WEEK_PLAN), Some("Publicar 3 vídeos"));
        assert!(fields.iter().all(|f| f.matched));
    }

    #[test]
    fn english_verdict() {
        let md = "## Next\n- Immediate action: buy a mic\n- Initial investment: $50\n- First week: 2 uploads";
        let fields = extract(&normalize(md), &ceo_action_plan());
        assert_eq!(fields.get(IMMEDIATE_ACTION), Some("buy a mic"));
        assert_eq!(fields.get(INVESTMENT), Some("$50"));
        assert_eq!(fields.get(FIRST_WEEK_PLAN), Some("2 uploads"));
    }

    #[test]
    fn next_step_wording() {
        let pt = "## Plano\n- Próximo passo: gravar o piloto\n- Investimento: R$ 50";
        let fields = extract(&normalize(pt), &ceo_action_plan());
        assert_eq!(fields.get(IMMEDIATE_ACTION), Some("gravar o piloto"));
        assert!(fields.iter().find(|f| f.name == IMMEDIATE_ACTION).unwrap().matched);
        assert_eq!(fields.get(INVESTMENT), Some("R$ 50"));

        let en = "- Next step: record the pilot";
        let fields = extract(&normalize(en), &ceo_action_plan());
        assert_eq!(fields.get(IMMEDIATE_ACTION), Some("record the pilot"));
    }

    #[test]
    fn step_heading_used_only_without_action_line() {
        let md = "## 🚀 PRÓXIMO PASSO IMEDIATO\n- Gravar hoje\n## Riscos";
        let fields = extract(&normalize(md), &ceo_action_plan());
        assert_eq!(fields.get(IMMEDIATE_ACTION), Some("Gravar hoje"));

        // heading above the action line; the action line still wins
        let fields = extract(&normalize(CEO), &ceo_action_plan());
        assert_eq!(fields.get(IMMEDIATE_ACTION), Some("Gravar o primeiro vídeo"));
    }

    #[test]
    fn first_idea_is_the_marker_line() {
        let md = "## 📊 3 IDEIAS DE CANAIS\n### IDEIA 1: Canal Mistérios\n- **RPM Estimado:** $6";
        let fields = extract(&normalize(md), &[first_idea()]);
        assert_eq!(fields.get(FIRST_IDEA), Some("IDEIA 1: Canal Mistérios"));
    }
}
