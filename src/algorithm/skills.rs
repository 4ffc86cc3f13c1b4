use crate::algorithm::types::Module;

/// Weight used for a category missing from the weighting table.
pub const DEFAULT_CATEGORY_WEIGHT: f64 = 0.25;

#[derive(Debug, Clone, Copy)]
pub struct SkillCategory {
    pub name: &'static str,
    pub module: Module,
    pub weight: f64,
    pub skills: &'static [&'static str],
}

pub const SKILL_HIERARCHY: &[SkillCategory] = &[
    SkillCategory {
        name: "Information and Ideas",
        module: Module::English,
        weight: 0.26,
        skills: &[
            "Inferences",
            "Command of Evidence",
            "Central Ideas and Details",
            "Quantitative Reasoning",
        ],
    },
    SkillCategory {
        name: "Craft and Structure",
        module: Module::English,
        weight: 0.28,
        skills: &[
            "Cross-Text Connections",
            "Words in Context",
            "Text Structure and Purpose",
            "Rhetorical Synthesis",
            "Vocabulary",
        ],
    },
    SkillCategory {
        name: "Expression of Ideas",
        module: Module::English,
        weight: 0.28,
        skills: &["Transitions", "Boundaries", "Development", "Organization"],
    },
    SkillCategory {
        name: "Standard English Conventions",
        module: Module::English,
        weight: 0.18,
        skills: &["Form, Structure, and Sense", "Punctuation", "Usage", "Agreement"],
    },
    SkillCategory {
        name: "Algebra",
        module: Module::Math,
        weight: 0.35,
        skills: &[
            "Linear equations in one variable",
            "Linear equations in two variables",
            "Linear functions",
            "Linear inequalities in one or two variables",
            "Systems of two linear equations in two variables",
            "Quadratic Equations",
        ],
    },
    SkillCategory {
        name: "Problem Solving and Data Analysis",
        module: Module::Math,
        weight: 0.15,
        skills: &[
            "Ratios, rates, proportional relationships, and units",
            "Percentages",
            "One-variable data: Distributions and measures of center and spread",
            "Inference from sample statistics and margin of error ",
            "Evaluating statistical claims: Observational studies and experiments ",
            "Probability and conditional probability",
            "Two-variable data: Models and scatterplots",
        ],
    },
    SkillCategory {
        name: "Advanced Math",
        module: Module::Math,
        weight: 0.35,
        skills: &[
            "Nonlinear equations in one variable and systems of equations in two variables ",
            "Nonlinear functions",
            "Equivalent expressions",
        ],
    },
    SkillCategory {
        name: "Geometry and Trigonometry",
        module: Module::Math,
        weight: 0.15,
        skills: &[
            "Lines, angles, and triangles",
            "Area and volume",
            "Circles",
            "Right triangles and trigonometry",
        ],
    },
];

pub fn categories_for_module(module: Module) -> impl Iterator<Item = &'static SkillCategory> {
    SKILL_HIERARCHY.iter().filter(move |c| c.module == module)
}

fn category_containing(skill: &str) -> Option<&'static SkillCategory> {
    SKILL_HIERARCHY.iter().find(|c| c.skills.contains(&skill))
}

pub fn module_for_skill(skill: &str) -> Option<Module> {
    category_containing(skill).map(|c| c.module)
}

pub fn category_for_skill(skill: &str) -> Option<&'static str> {
    category_containing(skill).map(|c| c.name)
}
