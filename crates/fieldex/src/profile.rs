//! The built-in valuation-report profile.
//!
//! One `FieldSpec` per schema field, grouped the way the report nests
//! them. Variant lists carry the label texts as they appear on the form,
//! plus known OCR misreads (e.g. `"Renu'r"` for `"Ground Rent"`).
//! Checkbox semantics differ by section: property-type style checkboxes
//! stay null when unresolved (tri-state), while the construction,
//! locality and services grids default to unticked (boolean false).

use resolver::{
    BoilerplateSet, Direction, FieldSpec, Mirror, NumberFormat, ResolverConfig, ValueKind,
};

fn text(path: &str, variants: &[&str]) -> FieldSpec {
    FieldSpec::new(path, ValueKind::Text, variants)
}

fn multiline(path: &str, variants: &[&str]) -> FieldSpec {
    FieldSpec::new(path, ValueKind::Multiline, variants).direction(Direction::Below)
}

fn number(path: &str, variants: &[&str]) -> FieldSpec {
    FieldSpec::new(path, ValueKind::Number, variants)
}

fn currency(path: &str, variants: &[&str]) -> FieldSpec {
    number(path, variants).format(NumberFormat::Currency)
}

fn year(path: &str, variants: &[&str]) -> FieldSpec {
    number(path, variants).format(NumberFormat::Year)
}

fn percent(path: &str, variants: &[&str]) -> FieldSpec {
    number(path, variants).format(NumberFormat::Percent)
}

fn digits(path: &str, variants: &[&str]) -> FieldSpec {
    text(path, variants).format(NumberFormat::Digits)
}

fn tri(path: &str, variants: &[&str]) -> FieldSpec {
    FieldSpec::new(path, ValueKind::TriState, variants)
}

fn boolean(path: &str, variants: &[&str]) -> FieldSpec {
    FieldSpec::new(path, ValueKind::Boolean, variants)
}

/// The complete valuation-report configuration.
pub fn valuation_report() -> ResolverConfig {
    let mut fields: Vec<FieldSpec> = Vec::new();

    // -- Report identity ----------------------------------------------------
    fields.extend([
        text("applicationType", &["VALUATION REPORT"]),
        digits("applicationNumber", &["Application Number"]).critical(),
        text("applicantName", &["Applicant(s) Surname(s) & Initials", "Surname(s) & Initials"])
            .direction(Direction::Both),
        text("dateOfInspection", &["Date of Inspection"]),
        multiline("propertyAddress", &["Property Address"]).critical(),
        text("postCode", &["Postcode"]).critical(),
    ]);

    // -- Property type ------------------------------------------------------
    fields.extend([
        tri("propertyType.isDetachedHouse", &["Detached House"]),
        tri("propertyType.isSemiDetachedHouse", &["Semi-Detached"]),
        tri("propertyType.isTerracedHouse", &["Terraced House"]),
        tri("propertyType.isBungalow", &["Bungalow"]),
        tri("propertyType.isFlat", &["Flat"]),
        tri("propertyType.isMaisonette", &["Maisonette"]),
        tri(
            "propertyType.isBuiltOrOwnedByLocalAuthority",
            &["Local Authority"],
        ),
        tri("propertyType.isFlatMaisonetteConverted", &["Converted"]),
        tri("propertyType.isPurposeBuilt", &["Purpose Built"]),
        tri("propertyType.isAboveCommercial", &["Above commercial"]),
        tri("propertyType.isFlyingFreehold", &["Flying freehold"]),
        tri("propertyType.isPartCommercialUse", &["commercial use"]),
        tri(
            "propertyType.isPurchasedUnderSharedOwnership",
            &["Shared Ownership"],
        ),
        number("propertyType.flatMaisonetteFloor", &["If flat/maisonette, what floor", "what floor"]),
        number("propertyType.numberOfFloorsInBlock", &["floors in block"]),
        percent(
            "propertyType.ownerOccupationPercentage",
            &["owner occupation"],
        ),
        year("propertyType.conversionYear", &["year of conversion"]),
        number("propertyType.numberOfUnitsInBlock", &["units in block"]),
        text("propertyType.residentialNatureImpact", &["Noise", "Odour"])
            .direction(Direction::Below),
        text("propertyType.tenure", &["Tenure"]).critical(),
        percent(
            "propertyType.flyingFreeholdPercentage",
            &["approximate % of flying freehold", "flying freehold percentage"],
        ),
        currency("propertyType.maintenanceCharge", &["Maintenance Charge"]),
        currency("propertyType.roadCharges", &["Road Charges", "Road Charge"]),
        currency("propertyType.groundRent", &["Ground Rent", "Renu'r"]),
        number(
            "propertyType.remainingLeaseTermYears",
            &["Remaining term of Lease"],
        ),
        percent(
            "propertyType.commercialUsePercentage",
            &["approximate % of commercial use", "commercial use percentage"],
        ),
        year("propertyType.yearBuilt", &["Year property built"]),
    ]);

    // -- Accommodation ------------------------------------------------------
    fields.extend([
        number("accommodation.hall", &["Hall"]),
        number("accommodation.livingRooms", &["Living Rooms"]),
        number("accommodation.kitchen", &["Kitchen"]),
        number("accommodation.utility", &["Utility"]),
        number("accommodation.bedrooms", &["Bedrooms"]),
        number("accommodation.bathrooms", &["Bathrooms"]),
        number("accommodation.separateWc", &["Separate WC"]),
        number("accommodation.basement", &["Basement"]),
        number("accommodation.garage", &["Garage"]),
        number("accommodation.parking", &["Parking"]),
        tri("accommodation.isLiftPresent", &["Lift"]),
        tri("accommodation.gardens", &["Gardens"]),
        tri("accommodation.isPrivate", &["Private"]),
        tri("accommodation.isCommunal", &["Communal"]),
        number("accommodation.numberOfOutbuildings", &["outbuildings"]),
        text("accommodation.outbuildingDetails", &["outbuilding details"]),
        number(
            "accommodation.grossFloorAreaOfDwelling",
            &["Gross floor area"],
        ),
    ]);

    // -- Current occupancy --------------------------------------------------
    fields.extend([
        tri("currentOccupency.isEverOccupied", &["ever been occupied"]),
        number(
            "currentOccupency.numberOfAdultsInProperty",
            &["adults appear to live"],
        ),
        tri(
            "currentOccupency.isHmoOrMultiUnitFreeholdBlock",
            &["HMO/Multi Unit"],
        ),
        tri("currentOccupency.isCurrentlyTenanted", &["tenanted at present"]),
        text(
            "currentOccupency.hmoOrMultiUnitDetails",
            &["HMO details", "Multi Unit details"],
        ),
    ]);

    // -- New build ----------------------------------------------------------
    fields.extend([
        tri("newBuild.isNewBuildOrRecentlyConverted", &["New Build"]),
        tri("newBuild.isCompleted", &["Completed"]),
        tri("newBuild.isUnderConstruction", &["Under Construction"]),
        tri(
            "newBuild.isFinalInspectionRequired",
            &["Final inspection required"],
        ),
        tri("newBuild.isNhbcCert", &["NHBC"]),
        tri("newBuild.isBuildZone", &["Buildzone"]),
        tri("newBuild.isPremier", &["Premier"]),
        tri(
            "newBuild.isProfessionalConsultant",
            &["Professional Consultant"],
        ),
        tri("newBuild.isOtherCert", &["Other Cert"]),
        tri("newBuild.isSelfBuildProject", &["Self-build"]),
        tri("newBuild.isInvolvesPartExchange", &["part exchange"]),
        tri(
            "newBuild.isDisclosureOfIncentivesSeen",
            &["Disclosure of Incentives"],
        ),
        text("newBuild.otherCertDetails", &["If Other, provide details"]),
        text(
            "newBuild.incentivesDetails",
            &["Including total value of incentives"],
        ),
        text("newBuild.newBuildDeveloperName", &["Developer"]),
    ]);

    // -- Construction -------------------------------------------------------
    fields.extend([
        boolean(
            "construction.isStandardConstruction",
            &["Standard construction"],
        ),
        text(
            "construction.nonStandardConstructionType",
            &["system or type"],
        ),
        boolean(
            "construction.isHasAlterationsOrExtensions",
            &["alterations", "extensions"],
        ),
        boolean(
            "construction.isAlterationsRequireConsents",
            &["require consents"],
        ),
        text("construction.mainWalls", &["Main Walls"]),
        text("construction.mainRoof", &["Main Roof"]),
        text("construction.garageConstruction", &["Garage:"]),
        text("construction.outbuildingsConstruction", &["Outbuildings:"]),
        number("construction.alterationsAge", &["years ago"]),
    ]);

    // -- Locality and demand ------------------------------------------------
    fields.extend([
        boolean("localityAndDemand.isUrban", &["Urban"]),
        boolean("localityAndDemand.isSuburban", &["Suburban"]),
        boolean("localityAndDemand.isRural", &["Rural"]),
        boolean("localityAndDemand.isGoodMarketAppeal", &["Good"]),
        boolean("localityAndDemand.isAverageMarketAppeal", &["Average"]),
        boolean("localityAndDemand.isPoorMarketAppeal", &["Poor"]),
        boolean("localityAndDemand.isOwnerResidential", &["Owner residential"]),
        boolean("localityAndDemand.isResidentialLet", &["Residential let"]),
        boolean("localityAndDemand.isCommercial", &["Commercial"]),
        boolean("localityAndDemand.isPricesRising", &["Prices Rising"]),
        boolean("localityAndDemand.isPricesStatic", &["Prices Static"]),
        boolean("localityAndDemand.isPricesFalling", &["Prices Falling"]),
        boolean("localityAndDemand.isDemandRising", &["Demand Rising"]),
        boolean("localityAndDemand.isDemandStatic", &["Demand Static"]),
        boolean("localityAndDemand.isDemandFalling", &["Demand Falling"]),
        boolean(
            "localityAndDemand.isAffectedByCompulsoryPurchase",
            &["Compulsory Purchase"],
        ),
        boolean(
            "localityAndDemand.isVacantOrBoardedPropertiesNearby",
            &["vacant or boarded"],
        ),
        boolean(
            "localityAndDemand.isOccupancyRestrictionPossible",
            &["Occupancy restriction"],
        ),
        boolean(
            "localityAndDemand.isCloseToHighVoltageEquipment",
            &["high voltage equipment"],
        ),
        text(
            "localityAndDemand.compulsoryPurchaseDetails",
            &["Compulsory Purchase details"],
        ),
        text(
            "localityAndDemand.vacantOrBoardedDetails",
            &["vacant or boarded details"],
        ),
        text(
            "localityAndDemand.occupancyRestrictionDetails",
            &["Occupancy restriction details"],
        ),
        text(
            "localityAndDemand.highVoltageEquipmentDetails",
            &["high voltage equipment details"],
        ),
    ]);

    // -- Services -----------------------------------------------------------
    fields.extend([
        boolean("services.isMainsWater", &["Mains"]),
        boolean("services.isPrivateWater", &["Private water"]),
        boolean("services.isUnknownWater", &["Unknown water"]),
        boolean("services.isGasSupply", &["Gas"]),
        boolean("services.isElectricitySupply", &["Electricity"]),
        boolean("services.isCentralHeating", &["Central Heating"]),
        boolean("services.isMainDrainage", &["Main drainage"]),
        boolean("services.isSepticTankPlant", &["Septic tank"]),
        boolean("services.isUnknownDrainage", &["Unknown drainage"]),
        boolean("services.isSolarPanels", &["Solar panels"]),
        boolean("services.isSharedAccess", &["Shared access"]),
        boolean("services.isRoadAdopted", &["Road adopted"]),
        boolean(
            "services.isHasEasementsOrRightsOfWay",
            &["Easements", "Rights of Way"],
        ),
        text("services.centralHeatingType", &["Central heating type"]),
        text(
            "services.easementsOrRightsDetails",
            &["Easements details", "Rights of Way details"],
        ),
    ]);

    // -- Energy efficiency --------------------------------------------------
    fields.extend([
        text("energyEfficiency.epcRating", &["EPC Rating"]),
        number("energyEfficiency.epcScore", &["EPC Score"]),
    ]);

    // -- Condition ----------------------------------------------------------
    fields.extend([
        tri(
            "conditionsOfProperty.isStructuralMovement",
            &["structural movement"],
        ),
        tri(
            "conditionsOfProperty.isStructuralMovementHistoricOrNonProgressive",
            &["historic or non-progressive"],
        ),
        multiline(
            "conditionsOfProperty.structuralMovementDetails",
            &["structural movement details"],
        ),
        tri(
            "conditionsOfProperty.isStructuralModifications",
            &["structural modifications"],
        ),
        multiline(
            "conditionsOfProperty.structuralModificationsDetails",
            &["structural modifications details"],
        ),
        tri(
            "conditionsOfProperty.communalAreasMaintained",
            &["communal areas maintained"],
        ),
        tri("conditionsOfProperty.propertyProneTo.flooding", &["flooding"]),
        tri(
            "conditionsOfProperty.propertyProneTo.subsidence",
            &["subsidence"],
        ),
        tri("conditionsOfProperty.propertyProneTo.heave", &["heave"]),
        tri("conditionsOfProperty.propertyProneTo.landslip", &["landslip"]),
        text(
            "conditionsOfProperty.propertyProneTo.details",
            &["If prone to any, provide details", "prone to details"],
        ),
        tri(
            "conditionsOfProperty.isPlotBoundariesDefinedUnderPointFourHectares",
            &["0.4 hectares"],
        ),
        tri(
            "conditionsOfProperty.isTreesWithinInfluencingDistance",
            &["trees within influencing distance", "influencing distance"],
        ),
        tri("conditionsOfProperty.isBuiltOnSteepSlope", &["steep slope"]),
    ]);

    // -- Specialist reports -------------------------------------------------
    fields.extend([
        tri("reports.isTimberDamp", &["Timber/Damp"]),
        tri("reports.isMining", &["Mining"]),
        tri("reports.isElectrical", &["Electrical"]),
        tri("reports.isDrains", &["Drains"]),
        tri("reports.isStructuralEngineers", &["Structural Engineer"]),
        tri("reports.isArboricultural", &["Arboricultural"]),
        tri("reports.isMundic", &["Mundic"]),
        tri("reports.isWallTies", &["Wall Ties"]),
        tri("reports.isRoof", &["Roof"]),
        tri("reports.isMetalliferous", &["Metalliferous"]),
    ]);

    // -- Rental information -------------------------------------------------
    fields.extend([
        tri(
            "rentalInformation.isRentalDemandInLocality",
            &["rental demand"],
        ),
        tri(
            "rentalInformation.isOtherLettingDemandFactors",
            &["other letting demand factors"],
        ),
        tri("rentalInformation.investorOnlyDemand", &["investor only demand"]),
        currency(
            "rentalInformation.monthlyMarketRentPresentCondition",
            &["monthly market rent in present condition", "monthly market rent"],
        ),
        currency(
            "rentalInformation.monthlyMarketRentImprovedCondition",
            &["monthly market rent in improved condition"],
        ),
    ]);

    // -- Valuation for finance ----------------------------------------------
    fields.extend([
        tri(
            "valuationForFinancePurpose.isSuitableForFinance",
            &["suitable security for finance"],
        ),
        currency(
            "valuationForFinancePurpose.marketValuePresentCondition",
            &["Market Value in present condition", "present condition"],
        )
        .critical(),
        currency(
            "valuationForFinancePurpose.marketValueAfterRepairs",
            &["after essential repairs"],
        ),
        currency(
            "valuationForFinancePurpose.purchasePriceOrBorrowerEstimate",
            &["purchase price", "borrower's estimate"],
        ),
        currency(
            "valuationForFinancePurpose.buildingInsuranceReinstatementCost",
            &["Reinstatement Cost"],
        ),
    ]);

    // -- Remarks and declaration --------------------------------------------
    fields.extend([
        multiline("generalRemarks", &["GENERAL REMARKS"]),
        tri("valuersDeclaration.valuerQualifications.mrics", &["MRICS"]),
        tri("valuersDeclaration.valuerQualifications.frics", &["FRICS"]),
        tri(
            "valuersDeclaration.valuerQualifications.assocRics",
            &["AssocRICS"],
        ),
        text(
            "valuersDeclaration.valuerName",
            &["Full Name of Valuer", "Name of Valuer"],
        ),
        text("valuersDeclaration.onBehalfOf", &["on behalf of"]),
        digits("valuersDeclaration.telephone", &["Telephone"]),
        text("valuersDeclaration.email", &["E-mail"]),
        digits("valuersDeclaration.ricsNumber", &["RICS Number"]),
        multiline("valuersDeclaration.valuerAddress", &["Address of Valuer"]),
        text("valuersDeclaration.valuerPostcode", &["Postcode"]),
        text("valuersDeclaration.reportDate", &["Report Date"]),
    ]);

    ResolverConfig {
        fields,
        boilerplate: BoilerplateSet {
            exact: vec![
                "please provide details".to_string(),
                "if yes, please provide details".to_string(),
                "if no, please provide details".to_string(),
            ],
            prefixes: vec![
                "behalf of any group".to_string(),
                "generality of the foregoing".to_string(),
                "mortgage administrator".to_string(),
                "trustee on behalf".to_string(),
                "interested in the mortgage".to_string(),
                "opinion likely".to_string(),
                "Gatehouse Bank".to_string(),
                "without prejudice to".to_string(),
            ],
        },
        stop_markers: [
            "PROPERTY TYPE",
            "ACCOMMODATION",
            "BUILDING SURVEY",
            "VALUATION",
            "Report Date",
            "CURRENT OCCUPANCY",
            "CONSTRUCTION",
            "LOCALITY & DEMAND",
            "SERVICES",
            "ENERGY EFFICIENCY",
            "ESSENTIAL REPAIRS",
            "RENTAL INFORMATION",
            "VALUATION FOR FINANCE",
            "GENERAL REMARKS",
            "VALUERS DECLARATION",
            "IMPORTANT NOTICE",
        ]
        .into_iter()
        .map(String::from)
        .collect(),
        tolerances: Default::default(),
        mirrors: vec![Mirror {
            from: "valuationForFinancePurpose".to_string(),
            to: "valuationForFinancePurposeHPP".to_string(),
        }],
        include_full_text: true,
    }
}
