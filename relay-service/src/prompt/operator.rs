/// Identity the browser client reports for its user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorProfile {
    pub name: String,
    pub faction: String,
    pub region: Option<String>,
}

impl OperatorProfile {
    /// Build a profile from the optional request fields.
    ///
    /// Name and faction are both required; a region on its own is ignored.
    pub fn from_fields(
        name: Option<&str>,
        faction: Option<&str>,
        region: Option<&str>,
    ) -> Option<Self> {
        let name = non_blank(name)?;
        let faction = non_blank(faction)?;

        Some(Self {
            name,
            faction,
            region: non_blank(region),
        })
    }

    /// The operator block appended to the briefing turn.
    pub fn render_context(&self) -> String {
        let mut block = format!(
            "### OPERATOR PROFILE ###\nCurrent Operator Name: {}\nOperator Faction Allegiance: {}",
            self.name, self.faction
        );
        if let Some(region) = &self.region {
            block.push_str("\nOperator Region: ");
            block.push_str(region);
        }
        block.push_str(
            "\n\nDIRECTIVE: Address this operator by name when appropriate. \
Acknowledge their faction allegiance and provide contextually relevant information based on their chosen faction. \
Consider their faction's perspective, allies, and rivals when responding to queries. \
Make the operator feel like a recognized member of the world of Yavar.",
        );
        block
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
