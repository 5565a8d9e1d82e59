//! First-boot content: what a fresh database is populated with.

use crate::{catalog::NewCatalogItem, content::ContentFields};

pub fn default_content() -> ContentFields {
  ContentFields {
    hero_label:           "◆ Innovation Redefined".into(),
    hero_title:           "The Future of Medical Aesthetics".into(),
    hero_description:     "We bring cutting-edge medical aesthetic technology to clinics \
                           and hospitals, with premium certified equipment and the support \
                           to get the most out of it."
      .into(),
    stat1_number:         "100%".into(),
    stat1_text:           "CE Certified Excellence".into(),
    stat2_number:         "24/7".into(),
    stat2_text:           "Technical Support".into(),
    features_label:       "◆ Why Choose Us".into(),
    features_title:       "Advancing Science. Elevating Life.".into(),
    features_description: "A distributor of advanced medical aesthetic devices, bringing \
                           world-class technology to your practice."
      .into(),
    products_label:       "◆ Our Portfolio".into(),
    products_title:       "Next-Gen Medical Devices".into(),
    products_description: "Premium aesthetic medical equipment from leading manufacturers."
      .into(),
    contact_tagline:      "◆ Connect With Us".into(),
    contact_title:        "Transform Your Practice".into(),
    contact_description:  "Ready to elevate your capabilities? Get in touch with our \
                           specialists to find the right solution for your practice."
      .into(),
    contact_phone:        "+00 000 0000".into(),
    contact_email:        "hello@example.com".into(),
    contact_address:      "1 Example Street\nExample City".into(),
    company_name:         "Vitrine".into(),
    company_tagline:      "Advancing Science. Elevating Life.".into(),
    footer_text:          "Premium technology and an unwavering commitment to excellence."
      .into(),
  }
}

fn item(order: i64, icon: &str, title: &str, description: &str) -> NewCatalogItem {
  NewCatalogItem {
    display_order: order,
    title:         title.into(),
    description:   description.into(),
    icon:          Some(icon.into()),
    image:         None,
  }
}

pub fn default_features() -> Vec<NewCatalogItem> {
  vec![
    item(1, "🎯", "Premium Quality", "Every device meets rigorous CE certification standards."),
    item(2, "🚀", "Innovation First", "Access to the latest aesthetic medical technology."),
    item(3, "💎", "Expert Support", "Training, technical support and ongoing assistance."),
    item(4, "🏥", "Trusted Partner", "Serving leading clinics and hospitals."),
    item(5, "🌏", "Global Vision", "Bringing global standards to local healthcare."),
    item(6, "✓", "Proven Results", "Measurable outcomes and patient satisfaction."),
  ]
}

pub fn default_products() -> Vec<NewCatalogItem> {
  vec![
    item(1, "⚡", "Advanced Laser Systems", "Precision laser technology with strong safety profiles."),
    item(2, "💉", "Injectable Solutions", "Delivery systems optimised for precision and control."),
    item(3, "🔬", "RF Energy Devices", "Radiofrequency technology for skin rejuvenation."),
  ]
}
