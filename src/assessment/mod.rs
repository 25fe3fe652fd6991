// 风险评估模块
// 血糖与症状分级，以及按分级结果查询的饮食表

pub mod classifier;
pub mod diet;

pub use classifier::{
    Assessment, AssessmentType, RiskCategory, RiskColor, SymptomAnswers, ValidationError,
    classify_glucose, classify_symptoms, parse_glucose,
};
pub use diet::DietPlan;
