//! Lays out the interview sheet for one case file.
//!
//! A single vertical cursor walks down the page. Every atomic block (field group, title,
//! wrapped line, table row) first reserves its height; when that would cross the bottom
//! margin a new page starts and the cursor returns to the top margin. Footers are stamped
//! once layout is complete and the page total is known.

use chrono::{NaiveDate, NaiveDateTime};

use crate::models::person::{
    ComplementaryCourse, EducationProfile, IncomeMember, PersonFields, PersonRecord,
    SocioEconomicProfile,
};
use crate::people::age::age_on;
use crate::report::config::LayoutConfig;
use crate::report::document::{Align, Document, DrawOp, Weight};
use crate::report::metrics::wrap_text;

pub const TITLE: &str = "FICHA DE ENTREVISTA DE USUARIOS";

// Heights reserved ahead of each block.
const SECTION_RESERVE: f32 = 25.0;
const SUBTITLE_RESERVE: f32 = 15.0;
const PERSONAL_BLOCK_RESERVE: f32 = 40.0;
const FIELD_GROUP_RESERVE: f32 = 20.0;
const DISABILITY_RESERVE: f32 = 25.0;
const INCOME_MEMBER_RESERVE: f32 = 25.0;
const COURSE_RESERVE: f32 = 35.0;

const DATE_FORMAT: &str = "%d/%m/%Y";

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "SI"
    } else {
        "NO"
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

struct SheetWriter<'a> {
    cfg: &'a LayoutConfig,
    doc: Document,
    y: f32,
}

impl<'a> SheetWriter<'a> {
    fn new(cfg: &'a LayoutConfig) -> Self {
        SheetWriter {
            cfg,
            doc: Document::new(cfg.page_width, cfg.page_height),
            y: cfg.margin,
        }
    }

    /// Starts a new page when a block of `needed` height would cross the bottom margin.
    fn ensure_space(&mut self, needed: f32) {
        if self.y + needed > self.cfg.bottom_limit() {
            self.doc.add_page();
            self.y = self.cfg.margin;
        }
    }

    fn text(&mut self, x: f32, y: f32, text: String, size: f32, weight: Weight, align: Align) {
        self.doc.push(DrawOp::Text {
            x,
            y,
            text,
            size,
            weight,
            align,
        });
    }

    /// Body-size text `dy` below the cursor. Does not move the cursor.
    fn field(&mut self, x: f32, dy: f32, text: String) {
        let size = self.cfg.body_size;
        self.text(x, self.y + dy, text, size, Weight::Regular, Align::Left);
    }

    /// Body-size text at the cursor, then advances by `advance`.
    fn field_line(&mut self, x: f32, text: String, advance: f32) {
        self.field(x, 0.0, text);
        self.y += advance;
    }

    fn rule(&mut self, x1: f32, x2: f32, y: f32) {
        self.doc.push(DrawOp::Line {
            x1,
            y1: y,
            x2,
            y2: y,
            width: self.cfg.rule_width,
        });
    }

    fn section_title(&mut self, title: &str) {
        self.ensure_space(SECTION_RESERVE);
        let cfg = self.cfg;
        self.text(
            cfg.left_column,
            self.y,
            title.to_string(),
            cfg.section_size,
            Weight::Bold,
            Align::Left,
        );
        self.rule(cfg.left_column, cfg.right_edge, self.y + 2.0);
        self.y += 15.0;
    }

    fn subtitle(&mut self, title: &str) {
        self.ensure_space(SUBTITLE_RESERVE);
        let cfg = self.cfg;
        self.text(
            cfg.left_column,
            self.y,
            title.to_string(),
            cfg.subtitle_size,
            Weight::Bold,
            Align::Left,
        );
        self.y += 10.0;
    }

    /// Wrapped paragraph; each line reserves its own height.
    fn long_text(&mut self, text: &str) {
        let cfg = self.cfg;
        for line in wrap_text(text, Weight::Regular, cfg.body_size, cfg.content_width) {
            self.ensure_space(cfg.text_line_height);
            self.field_line(cfg.left_column, line, cfg.text_line_height);
        }
    }

    // ────────────────────────────────────────────────────────────────────────
    // Sections
    // ────────────────────────────────────────────────────────────────────────

    fn header(&mut self, today: NaiveDate) {
        let cfg = self.cfg;
        self.text(
            cfg.center_x(),
            self.y,
            TITLE.to_string(),
            cfg.title_size,
            Weight::Bold,
            Align::Center,
        );
        self.y += 20.0;

        self.text(
            cfg.right_edge,
            self.y,
            format!("Fecha de generación: {}", format_date(today)),
            cfg.date_size,
            Weight::Regular,
            Align::Right,
        );
        self.y += 15.0;

        self.rule(cfg.margin, cfg.right_edge, self.y);
        self.y += 10.0;
    }

    fn personal_data(&mut self, f: &PersonFields, today: NaiveDate) {
        let (left, right) = (self.cfg.left_column, self.cfg.right_column);
        let pitch = self.cfg.field_line_height;

        self.section_title("DATOS PERSONALES");
        self.ensure_space(PERSONAL_BLOCK_RESERVE);

        self.field(left, 0.0, format!("Nombre: {}", f.name));
        self.field(left, pitch, format!("Apellidos: {}", f.surnames));
        self.field(
            left,
            2.0 * pitch,
            format!("Fecha Nacimiento: {}", format_date(f.birth_date)),
        );
        self.field(
            left,
            3.0 * pitch,
            format!("Edad: {} años", age_on(f.birth_date, today)),
        );
        self.field(left, 4.0 * pitch, format!("Nacionalidad: {}", f.nationality));

        self.field(right, 0.0, format!("Documento: {}", f.identity_document));
        self.field(right, pitch, format!("Sexo: {}", f.sex.label()));
        self.field(right, 2.0 * pitch, format!("Localidad: {}", f.locality));
        if let Some(cp) = &f.postal_code {
            self.field(right, 3.0 * pitch, format!("C.P.: {cp}"));
        }
        if let Some(nss) = &f.social_security_number {
            self.field(right, 4.0 * pitch, format!("Nº Seg. Social: {nss}"));
        }
        self.y += 45.0;

        self.ensure_space(SUBTITLE_RESERVE);
        self.field_line(left, format!("Dirección: {}", f.address), 10.0);

        self.ensure_space(FIELD_GROUP_RESERVE);
        let contact = [
            ("Teléfono 1", &f.phone1),
            ("Teléfono 2", &f.phone2),
            ("Email", &f.email),
        ];
        for (label, value) in contact {
            if let Some(value) = value {
                self.field_line(left, format!("{label}: {value}"), pitch);
            }
        }

        self.ensure_space(FIELD_GROUP_RESERVE);
        self.field(
            left,
            0.0,
            format!("Carnet de conducir: {}", yes_no(f.driving_license)),
        );
        self.field(
            right,
            0.0,
            format!("Vehículo propio: {}", yes_no(f.own_vehicle)),
        );
        self.y += 15.0;
    }

    fn disability(&mut self, f: &PersonFields) {
        let left = self.cfg.left_column;
        let pitch = self.cfg.field_line_height;

        self.subtitle("INFORMACIÓN DE DISCAPACIDAD");
        self.ensure_space(DISABILITY_RESERVE);

        if let Some(pct) = f.disability_percentage {
            self.field_line(left, format!("Porcentaje: {pct}%"), pitch);
        }
        let details = [
            ("Tipo", &f.disability_type),
            ("Entidad Derivación", &f.referral_entity),
            ("Técnico Derivación", &f.referral_technician),
            ("Colectivo", &f.collective),
        ];
        for (label, value) in details {
            if let Some(value) = value {
                self.field_line(left, format!("{label}: {value}"), pitch);
            }
        }
        self.y += 10.0;
    }

    fn socio_economic(&mut self, se: &SocioEconomicProfile, members: &[IncomeMember]) {
        self.section_title("DATOS SOCIO-FAMILIARES Y ECONÓMICOS");

        self.subtitle("1. COMPOSICIÓN FAMILIAR");
        self.long_text(&se.family_composition);
        self.y += 10.0;

        self.subtitle("2. SITUACIÓN ECONÓMICA");
        self.long_text(&se.economic_situation);
        self.y += 10.0;

        if !members.is_empty() {
            let left = self.cfg.left_column;
            let indent = left + self.cfg.item_indent;
            self.subtitle("MIEMBROS PERCEPTORES DE INGRESOS");
            for (i, member) in members.iter().enumerate() {
                self.ensure_space(INCOME_MEMBER_RESERVE);
                self.field_line(left, format!("Miembro {}:", i + 1), 8.0);
                self.field_line(indent, format!("  • Número: {}", member.number), 6.0);
                self.field_line(indent, format!("  • Tipo: {}", member.kind), 6.0);
                self.field_line(indent, format!("  • Cantidad: €{:.2}", member.amount), 10.0);
            }
        }

        if let Some(other) = &se.other_circumstances {
            self.subtitle("3. OTRAS SITUACIONES Y CIRCUNSTANCIAS DE INTERÉS");
            self.long_text(other);
            self.y += 10.0;
        }
    }

    fn education(&mut self, ed: &EducationProfile) {
        let left = self.cfg.left_column;

        self.section_title("DATOS FORMATIVOS Y LABORALES");
        self.subtitle("FORMACIÓN ACADÉMICA");

        self.ensure_space(FIELD_GROUP_RESERVE);
        self.field_line(left, format!("Nivel: {}", ed.level.label()), 10.0);
        if let Some(spec) = &ed.specification {
            self.field_line(left, format!("Especificación: {spec}"), 10.0);
        }
        if let Some(year) = ed.completion_year {
            self.field_line(left, format!("Año Finalización: {year}"), 10.0);
        }

        if let Some(experience) = &ed.prior_experience {
            self.subtitle("EXPERIENCIA LABORAL PREVIA");
            self.long_text(experience);
            self.y += 10.0;
        }
    }

    fn courses(&mut self, courses: &[ComplementaryCourse]) {
        let left = self.cfg.left_column;
        let indent = left + self.cfg.item_indent;

        self.section_title("FORMACIÓN COMPLEMENTARIA");
        for (i, course) in courses.iter().enumerate() {
            self.ensure_space(COURSE_RESERVE);
            self.field_line(left, format!("Curso {}:", i + 1), 8.0);
            self.field_line(indent, format!("  • Nombre: {}", course.name), 6.0);
            self.field_line(
                indent,
                format!("  • Duración: {} horas", course.duration_hours),
                6.0,
            );
            self.field_line(indent, format!("  • Entidad: {}", course.entity), 6.0);
            self.field_line(
                indent,
                format!("  • Fecha: {}", format_date(course.completed_on)),
                12.0,
            );
        }
    }

    /// Blank follow-up grid filled in by hand. The header row is repeated after a page break.
    fn tracking_table(&mut self) {
        let row_height = self.cfg.tracking_row_height;

        self.section_title("SEGUIMIENTO");
        self.ensure_space(2.0 * row_height);
        self.table_row(true);
        for _ in 0..self.cfg.tracking_rows {
            let pages = self.doc.page_count();
            self.ensure_space(row_height);
            if self.doc.page_count() != pages {
                self.table_row(true);
            }
            self.table_row(false);
        }
    }

    fn table_row(&mut self, header: bool) {
        let cfg = self.cfg;
        let h = cfg.tracking_row_height;
        let mut x = cfg.left_column;
        for (label, w) in &cfg.tracking_columns {
            self.doc.push(DrawOp::Rect {
                x,
                y: self.y,
                w: *w,
                h,
                width: cfg.rule_width,
            });
            if header {
                self.text(
                    x + 2.0,
                    self.y + h * 0.65,
                    label.clone(),
                    cfg.date_size,
                    Weight::Bold,
                    Align::Left,
                );
            }
            x += w;
        }
        self.y += h;
    }
}

/// Page `i of N` on every page, the generation timestamp on the first.
fn stamp_footers(doc: &mut Document, cfg: &LayoutConfig, generated_at: NaiveDateTime) {
    let total = doc.page_count();
    for (i, page) in doc.pages.iter_mut().enumerate() {
        page.ops.push(DrawOp::Text {
            x: cfg.center_x(),
            y: cfg.footer_page_y,
            text: format!("Página {} de {}", i + 1, total),
            size: cfg.footer_size,
            weight: Weight::Regular,
            align: Align::Center,
        });
        if i == 0 {
            page.ops.push(DrawOp::Text {
                x: cfg.center_x(),
                y: cfg.footer_stamp_y,
                text: format!(
                    "Generado el: {}",
                    generated_at.format("%d/%m/%Y %H:%M:%S")
                ),
                size: cfg.footer_size,
                weight: Weight::Regular,
                align: Align::Center,
            });
        }
    }
}

/// Lays out the full sheet for `person` as of `generated_at` (local time).
pub fn layout_sheet(
    person: &PersonRecord,
    cfg: &LayoutConfig,
    generated_at: NaiveDateTime,
) -> Document {
    let today = generated_at.date();
    let mut writer = SheetWriter::new(cfg);

    writer.header(today);
    writer.personal_data(&person.fields, today);
    if person.fields.has_disability {
        writer.disability(&person.fields);
    }
    if let Some(se) = &person.socio_economic {
        writer.socio_economic(se, &person.income_members);
    }
    if let Some(ed) = &person.education {
        writer.education(ed);
    }
    if !person.courses.is_empty() {
        writer.courses(&person.courses);
    }
    writer.tracking_table();

    let mut doc = writer.doc;
    stamp_footers(&mut doc, cfg, generated_at);
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::person::EducationLevel;
    use crate::people::test_support::{course, person_named};

    fn generated_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(10, 15, 30)
            .unwrap()
    }

    fn all_texts(doc: &Document) -> Vec<String> {
        doc.pages
            .iter()
            .flat_map(|p| p.texts().map(str::to_string).collect::<Vec<_>>())
            .collect()
    }

    fn position(texts: &[String], needle: &str) -> usize {
        texts
            .iter()
            .position(|t| t == needle)
            .unwrap_or_else(|| panic!("missing {needle:?}"))
    }

    fn full_record() -> PersonRecord {
        let mut p = person_named("Lucía", "Fernández Ruiz");
        p.fields.has_disability = true;
        p.fields.disability_percentage = Some(33);
        p.fields.postal_code = Some("18001".into());
        p.fields.phone1 = Some("600000001".into());
        p.socio_economic = Some(SocioEconomicProfile {
            family_composition: "Vive con su madre y dos hermanos.".into(),
            economic_situation: "Ingresos por prestación.".into(),
            other_circumstances: Some("Sin otras circunstancias.".into()),
        });
        p.income_members = vec![
            IncomeMember { number: 1, kind: "Pensión".into(), amount: 480.5 },
            IncomeMember { number: 2, kind: "Nómina".into(), amount: 1100.0 },
        ];
        p.education = Some(EducationProfile {
            level: EducationLevel::FpiCicloGradoMedio,
            completion_year: Some(2015),
            specification: Some("Cocina".into()),
            prior_experience: Some("Ayudante de cocina".into()),
        });
        p.courses = vec![course("Manipulador de alimentos"), course("Inglés A2")];
        p
    }

    #[test]
    fn test_sections_appear_in_order() {
        let cfg = LayoutConfig::default();
        let doc = layout_sheet(&full_record(), &cfg, generated_at());
        let texts = all_texts(&doc);

        let order = [
            TITLE,
            "DATOS PERSONALES",
            "INFORMACIÓN DE DISCAPACIDAD",
            "DATOS SOCIO-FAMILIARES Y ECONÓMICOS",
            "1. COMPOSICIÓN FAMILIAR",
            "2. SITUACIÓN ECONÓMICA",
            "MIEMBROS PERCEPTORES DE INGRESOS",
            "3. OTRAS SITUACIONES Y CIRCUNSTANCIAS DE INTERÉS",
            "DATOS FORMATIVOS Y LABORALES",
            "FORMACIÓN ACADÉMICA",
            "EXPERIENCIA LABORAL PREVIA",
            "FORMACIÓN COMPLEMENTARIA",
            "SEGUIMIENTO",
        ];
        let positions: Vec<usize> = order.iter().map(|t| position(&texts, t)).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{positions:?}");

        assert!(texts.contains(&"Fecha de generación: 19/10/2026".to_string()));
        assert!(texts.contains(&"Edad: 36 años".to_string()));
        assert!(texts.contains(&"Porcentaje: 33%".to_string()));
        assert!(texts.contains(&"  • Cantidad: €480.50".to_string()));
        assert!(texts.contains(&"Nivel: F.P.I/Ciclo Gº Medio".to_string()));
    }

    #[test]
    fn test_optional_sections_are_skipped() {
        let cfg = LayoutConfig::default();
        let doc = layout_sheet(&person_named("Ana", "López"), &cfg, generated_at());
        let texts = all_texts(&doc);

        for absent in [
            "INFORMACIÓN DE DISCAPACIDAD",
            "DATOS SOCIO-FAMILIARES Y ECONÓMICOS",
            "DATOS FORMATIVOS Y LABORALES",
            "FORMACIÓN COMPLEMENTARIA",
        ] {
            assert!(!texts.iter().any(|t| t == absent), "{absent}");
        }
        assert!(texts.iter().any(|t| t == "SEGUIMIENTO"));
        assert!(!texts.iter().any(|t| t.starts_with("C.P.")));
    }

    #[test]
    fn test_list_items_keep_stored_order() {
        let cfg = LayoutConfig::default();
        let doc = layout_sheet(&full_record(), &cfg, generated_at());
        let texts = all_texts(&doc);

        let first = position(&texts, "  • Nombre: Manipulador de alimentos");
        let second = position(&texts, "  • Nombre: Inglés A2");
        assert!(first < second);
        assert!(position(&texts, "Miembro 1:") < position(&texts, "Miembro 2:"));
        assert!(position(&texts, "  • Tipo: Pensión") < position(&texts, "  • Tipo: Nómina"));
    }

    #[test]
    fn test_long_text_breaks_before_the_overflowing_line() {
        let cfg = LayoutConfig::default();
        let text: String = (0..400)
            .map(|i| format!("palabra{i:03}"))
            .collect::<Vec<_>>()
            .join(" ");
        let mut p = person_named("Ana", "López");
        p.socio_economic = Some(SocioEconomicProfile {
            family_composition: "Unidad familiar de dos miembros.".into(),
            economic_situation: text.clone(),
            other_circumstances: None,
        });

        let doc = layout_sheet(&p, &cfg, generated_at());
        let expected = wrap_text(&text, Weight::Regular, cfg.body_size, cfg.content_width);
        assert!(expected.len() > 40, "needs more than a page of lines");

        let mut placed: Vec<(usize, f32, String)> = Vec::new();
        for (page_idx, page) in doc.pages.iter().enumerate() {
            for op in &page.ops {
                if let DrawOp::Text { y, text, .. } = op {
                    if expected.contains(text) {
                        placed.push((page_idx, *y, text.clone()));
                    }
                }
            }
        }

        // Every wrapped line drawn exactly once, whole, in order.
        let drawn: Vec<&String> = placed.iter().map(|(_, _, t)| t).collect();
        assert_eq!(drawn, expected.iter().collect::<Vec<_>>());

        let lh = cfg.text_line_height;
        for pair in placed.windows(2) {
            let (page_a, y_a, _) = &pair[0];
            let (page_b, y_b, _) = &pair[1];
            assert!(y_a + lh <= cfg.bottom_limit());
            if page_a == page_b {
                assert!((y_b - y_a - lh).abs() < 1e-4);
            } else {
                assert_eq!(*page_b, page_a + 1);
                assert!(y_a + 2.0 * lh > cfg.bottom_limit(), "broke too early");
                assert!((y_b - cfg.margin).abs() < 1e-4);
            }
        }
        assert!(placed.iter().any(|(page, _, _)| *page > 0));
    }

    #[test]
    fn test_footer_on_every_page() {
        let cfg = LayoutConfig::default();
        let mut p = full_record();
        if let Some(se) = p.socio_economic.as_mut() {
            se.economic_situation = "Texto extenso. ".repeat(600);
        }
        let doc = layout_sheet(&p, &cfg, generated_at());
        let total = doc.page_count();
        assert!(total >= 3);

        for (i, page) in doc.pages.iter().enumerate() {
            let texts: Vec<&str> = page.texts().collect();
            let footer = format!("Página {} de {}", i + 1, total);
            assert_eq!(texts.iter().filter(|t| **t == footer).count(), 1);
            let stamped = texts.iter().any(|t| t.starts_with("Generado el: "));
            assert_eq!(stamped, i == 0, "page {}", i + 1);
        }
        assert!(doc.pages[0]
            .texts()
            .any(|t| t == "Generado el: 19/10/2026 10:15:30"));
    }

    #[test]
    fn test_tracking_table_grid() {
        let cfg = LayoutConfig::default();
        let doc = layout_sheet(&person_named("Ana", "López"), &cfg, generated_at());

        let mut rects = 0;
        for page in &doc.pages {
            for op in &page.ops {
                if let DrawOp::Rect { y, h, .. } = op {
                    rects += 1;
                    assert!(y + h <= cfg.bottom_limit() + 1e-4);
                }
            }
        }
        let texts = all_texts(&doc);
        let header_rows = texts.iter().filter(|t| *t == "FECHA").count();
        assert!(header_rows >= 1);
        assert_eq!(
            rects,
            (cfg.tracking_rows + header_rows) * cfg.tracking_columns.len()
        );
        for header in ["ACTUACIÓN", "OBSERVACIONES"] {
            assert_eq!(texts.iter().filter(|t| *t == header).count(), header_rows);
        }
    }

    #[test]
    fn test_table_header_repeats_after_page_break() {
        let cfg = LayoutConfig::default();
        let doc = layout_sheet(&person_named("Ana", "López"), &cfg, generated_at());
        // The minimal sheet overflows the grid onto a second page.
        assert_eq!(doc.page_count(), 2);
        assert!(doc.pages[1].texts().any(|t| t == "FECHA"));
    }
}
