//! WiX v4 serialization of a [`Manifest`].
//!
//! Output depends only on the manifest, so the same inputs always render
//! the same bytes. Attribute values are escaped on the way in, with line
//! breaks written as character references so they survive parsing.

use quick_xml::escape::escape;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::Writer;
use std::borrow::Cow;
use std::io::Cursor;

use crate::error::Result;
use crate::manifest::Manifest;
use crate::plugin::COMPANY_DIR_ID;
use crate::{DirectoryContents, ProductInfo};

const WIX_NAMESPACE: &str = "http://wixtoolset.org/schemas/v4/wxs";
const WIX_UI_NAMESPACE: &str = "http://wixtoolset.org/schemas/v4/wxs/ui";
const WXL_NAMESPACE: &str = "http://wixtoolset.org/schemas/v4/wxl";

struct XmlDoc {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl XmlDoc {
    fn new() -> Result<Self> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 4);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        Ok(XmlDoc { writer })
    }

    fn element(name: &str, attrs: &[(&str, &str)]) -> BytesStart<'static> {
        let mut element = BytesStart::new(name.to_string());
        for &(key, value) in attrs {
            element.push_attribute(Self::attribute(key, value));
        }
        element
    }

    /// Parsers turn raw newlines in attribute values into spaces.
    fn attribute<'a>(key: &'a str, value: &str) -> Attribute<'a> {
        let escaped = escape(value).replace('\n', "&#10;");
        Attribute {
            key: QName(key.as_bytes()),
            value: Cow::Owned(escaped.into_bytes()),
        }
    }

    fn open(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        self.writer.write_event(Event::Start(Self::element(name, attrs)))?;
        Ok(())
    }

    fn close(&mut self, name: &str) -> Result<()> {
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        self.writer.write_event(Event::Empty(Self::element(name, attrs)))?;
        Ok(())
    }

    fn finish(self) -> String {
        let mut text = String::from_utf8_lossy(&self.writer.into_inner().into_inner()).into_owned();
        text.push('\n');
        text
    }
}

/// Renders the `.wxs` installer source.
pub fn render_wxs(manifest: &Manifest) -> Result<String> {
    let product = &manifest.product;
    let mut doc = XmlDoc::new()?;

    doc.open("Wix", &[("xmlns", WIX_NAMESPACE), ("xmlns:ui", WIX_UI_NAMESPACE)])?;
    doc.open(
        "Package",
        &[
            ("Name", &product.product_name),
            ("Manufacturer", &product.publisher),
            ("Version", &product.version),
            ("UpgradeCode", &manifest.upgrade_code),
            ("Scope", "perMachine"),
            ("Compressed", "yes"),
        ],
    )?;

    write_upgrade_rules(&mut doc, manifest)?;
    doc.empty("MediaTemplate", &[("EmbedCab", "yes")])?;
    write_properties(&mut doc, manifest)?;
    write_directory_skeleton(&mut doc, product)?;

    for payload in &manifest.payloads {
        doc.open("DirectoryRef", &[("Id", payload.directory_ref)])?;
        write_contents(&mut doc, &payload.contents)?;
        doc.close("DirectoryRef")?;
    }

    write_features(&mut doc, manifest)?;
    write_ui_variables(&mut doc, manifest)?;
    write_ui(&mut doc, product)?;

    doc.close("Package")?;
    doc.close("Wix")?;
    Ok(doc.finish())
}

fn write_upgrade_rules(doc: &mut XmlDoc, manifest: &Manifest) -> Result<()> {
    doc.empty(
        "MajorUpgrade",
        &[("AllowDowngrades", "yes"), ("Schedule", "afterInstallInitialize")],
    )?;
    doc.open("Upgrade", &[("Id", &manifest.upgrade_code)])?;
    doc.empty(
        "UpgradeVersion",
        &[
            ("Minimum", &manifest.product.version),
            ("IncludeMinimum", "no"),
            ("OnlyDetect", "yes"),
            ("Property", "DOWNGRADE_DETECTED"),
        ],
    )?;
    doc.close("Upgrade")
}

fn write_properties(doc: &mut XmlDoc, manifest: &Manifest) -> Result<()> {
    if let Some(icon) = &manifest.assets.icon {
        let icon = icon.display().to_string();
        doc.empty("Icon", &[("Id", "AppIcon.ico"), ("SourceFile", &icon)])?;
        doc.empty("Property", &[("Id", "ARPPRODUCTICON"), ("Value", "AppIcon.ico")])?;
    }
    if let Some(description) = &manifest.product.description {
        doc.empty("SummaryInformation", &[("Description", description)])?;
    }
    if let Some(website) = &manifest.product.website {
        doc.empty("Property", &[("Id", "ARPURLINFOABOUT"), ("Value", website)])?;
    }
    Ok(())
}

/// Well-known target folders, emitted whether or not their format is present.
fn write_directory_skeleton(doc: &mut XmlDoc, product: &ProductInfo) -> Result<()> {
    doc.open("StandardDirectory", &[("Id", "CommonFiles64Folder")])?;
    doc.empty("Directory", &[("Id", "VST3DIR"), ("Name", "VST3")])?;
    doc.empty("Directory", &[("Id", "CLAPDIR"), ("Name", "CLAP")])?;
    doc.empty("Directory", &[("Id", "LV2DIR"), ("Name", "LV2")])?;
    doc.open("Directory", &[("Id", "AvidDir"), ("Name", "Avid")])?;
    doc.open("Directory", &[("Id", "AudioDir"), ("Name", "Audio")])?;
    doc.empty("Directory", &[("Id", "AAXDIR"), ("Name", "Plug-Ins")])?;
    doc.close("Directory")?;
    doc.close("Directory")?;
    doc.close("StandardDirectory")?;

    doc.open("StandardDirectory", &[("Id", "ProgramFiles64Folder")])?;
    doc.empty("Directory", &[("Id", COMPANY_DIR_ID), ("Name", &product.publisher)])?;
    doc.close("StandardDirectory")
}

fn write_contents(doc: &mut XmlDoc, contents: &DirectoryContents) -> Result<()> {
    for unit in &contents.units {
        let source = unit.source.display().to_string();
        doc.open("Component", &[("Id", &unit.component_id), ("Guid", &unit.guid)])?;
        match &unit.install_name {
            Some(name) => doc.empty(
                "File",
                &[("Id", &unit.file_id), ("Source", &source), ("Name", name), ("KeyPath", "yes")],
            )?,
            None => doc.empty("File", &[("Id", &unit.file_id), ("Source", &source), ("KeyPath", "yes")])?,
        }
        doc.close("Component")?;
    }

    for child in &contents.children {
        doc.open("Directory", &[("Id", &child.id), ("Name", &child.name)])?;
        write_contents(doc, &child.contents)?;
        doc.close("Directory")?;
    }
    Ok(())
}

fn write_features(doc: &mut XmlDoc, manifest: &Manifest) -> Result<()> {
    doc.open(
        "Feature",
        &[
            ("Id", "Complete"),
            ("Title", &manifest.product.product_name),
            ("Display", "expand"),
            ("Level", "1"),
            ("ConfigurableDirectory", COMPANY_DIR_ID),
        ],
    )?;
    for feature in &manifest.features {
        doc.open("Feature", &[("Id", &feature.id), ("Title", &feature.title), ("Level", "1")])?;
        for component_id in &feature.component_ids {
            doc.empty("ComponentRef", &[("Id", component_id)])?;
        }
        doc.close("Feature")?;
    }
    doc.close("Feature")
}

fn write_ui_variables(doc: &mut XmlDoc, manifest: &Manifest) -> Result<()> {
    let assets = &manifest.assets;
    let license = assets.license.path().display().to_string();
    doc.empty("WixVariable", &[("Id", "WixUILicenseRtf"), ("Value", &license)])?;
    if let Some(banner) = &assets.banner {
        doc.empty("WixVariable", &[("Id", "WixUIBannerBmp"), ("Value", &banner.display().to_string())])?;
    }
    if let Some(dialog) = &assets.dialog {
        doc.empty("WixVariable", &[("Id", "WixUIDialogBmp"), ("Value", &dialog.display().to_string())])?;
    }
    Ok(())
}

/// Feature-tree UI with a downgrade warning in front of the license page.
fn write_ui(doc: &mut XmlDoc, product: &ProductInfo) -> Result<()> {
    doc.open("UI", &[])?;
    doc.empty("ui:WixUI", &[("Id", "WixUI_FeatureTree")])?;
    doc.empty("UIRef", &[("Id", "WixUI_ErrorProgressText")])?;

    let warning = format!(
        "You are attempting to install version {}. Installing this version will downgrade \
         your current installation.\n\nDo you want to continue?",
        product.version
    );
    doc.open(
        "Dialog",
        &[("Id", "DowngradeWarningDlg"), ("Width", "370"), ("Height", "270"), ("Title", "Downgrade Warning")],
    )?;
    doc.empty(
        "Control",
        &[
            ("Id", "Title"),
            ("Type", "Text"),
            ("X", "15"),
            ("Y", "6"),
            ("Width", "200"),
            ("Height", "15"),
            ("Transparent", "yes"),
            ("NoPrefix", "yes"),
            ("Text", r"{\WixUI_Font_Title}Downgrade Detected"),
        ],
    )?;
    doc.empty(
        "Control",
        &[
            ("Id", "Description"),
            ("Type", "Text"),
            ("X", "25"),
            ("Y", "23"),
            ("Width", "280"),
            ("Height", "15"),
            ("Transparent", "yes"),
            ("NoPrefix", "yes"),
            ("Text", "A newer version of this product is already installed."),
        ],
    )?;
    doc.empty(
        "Control",
        &[
            ("Id", "Text"),
            ("Type", "Text"),
            ("X", "25"),
            ("Y", "60"),
            ("Width", "320"),
            ("Height", "60"),
            ("Text", &warning),
        ],
    )?;
    doc.open(
        "Control",
        &[
            ("Id", "Yes"),
            ("Type", "PushButton"),
            ("X", "236"),
            ("Y", "243"),
            ("Width", "56"),
            ("Height", "17"),
            ("Default", "yes"),
            ("Text", "Yes"),
        ],
    )?;
    doc.empty("Publish", &[("Event", "NewDialog"), ("Value", "LicenseAgreementDlg")])?;
    doc.close("Control")?;
    doc.open(
        "Control",
        &[
            ("Id", "No"),
            ("Type", "PushButton"),
            ("X", "304"),
            ("Y", "243"),
            ("Width", "56"),
            ("Height", "17"),
            ("Cancel", "yes"),
            ("Text", "No"),
        ],
    )?;
    doc.empty("Publish", &[("Event", "EndDialog"), ("Value", "Exit")])?;
    doc.close("Control")?;
    doc.empty(
        "Control",
        &[
            ("Id", "BannerBitmap"),
            ("Type", "Bitmap"),
            ("X", "0"),
            ("Y", "0"),
            ("Width", "370"),
            ("Height", "44"),
            ("TabSkip", "no"),
            ("Text", "!(loc.InstallDirDlgBannerBitmap)"),
        ],
    )?;
    for (id, y) in [("BannerLine", "44"), ("BottomLine", "234")] {
        doc.empty(
            "Control",
            &[("Id", id), ("Type", "Line"), ("X", "0"), ("Y", y), ("Width", "370"), ("Height", "0")],
        )?;
    }
    doc.close("Dialog")?;

    doc.empty(
        "Publish",
        &[
            ("Dialog", "WelcomeDlg"),
            ("Control", "Next"),
            ("Event", "NewDialog"),
            ("Value", "DowngradeWarningDlg"),
            ("Order", "1"),
            ("Condition", "DOWNGRADE_DETECTED"),
        ],
    )?;
    doc.empty(
        "Publish",
        &[
            ("Dialog", "WelcomeDlg"),
            ("Control", "Next"),
            ("Event", "NewDialog"),
            ("Value", "LicenseAgreementDlg"),
            ("Order", "2"),
            ("Condition", "NOT DOWNGRADE_DETECTED"),
        ],
    )?;
    doc.close("UI")
}

/// Renders the `.wxl` localization overrides for the welcome dialog.
pub fn render_wxl(product: &ProductInfo) -> Result<String> {
    let mut doc = XmlDoc::new()?;
    let title = format!(r"{{\WixUI_Font_Title}}Welcome to the {} Installer", product.product_name);
    let description = format!(
        "The installer will guide you through the steps required to install {} on your computer.",
        product.product_name
    );

    doc.open("WixLocalization", &[("Culture", "en-us"), ("xmlns", WXL_NAMESPACE)])?;
    doc.empty("String", &[("Id", "WelcomeDlgTitle"), ("Value", &title)])?;
    doc.empty("String", &[("Id", "WelcomeDlgDescription"), ("Value", &description)])?;
    doc.close("WixLocalization")?;
    Ok(doc.finish())
}
