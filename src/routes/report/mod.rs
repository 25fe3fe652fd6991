mod handler;
mod model;

pub use handler::{
    clinical_page,
    food_chart,
    predict_clinical,
    predict_symptoms,
    show_result,
    symptoms_page,
};
pub use model::{NewReport, Report};
